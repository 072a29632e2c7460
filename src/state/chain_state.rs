/// Review pagination state definitions
///
/// Each restaurant runs `Fetching(1) -> Emitting -> Fetching(n + 1) | Stopped`.
use chrono::NaiveDate;
use std::fmt;

/// Why a restaurant's review chain stopped
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    // ===== Normal Completion =====
    /// A review older than the recency cutoff was reached
    StaleReview { date: NaiveDate },

    /// The last page reported by the platform was processed
    LastPage,

    /// The per-restaurant page cap was reached
    PageLimit { pages: u32 },

    // ===== Data Integrity =====
    /// A review timestamp could not be normalized
    UnrecognizedDate { text: String },

    // ===== Errors =====
    /// The page could not be fetched (network, retry exhaustion, rejected status)
    FetchFailed { message: String },

    /// The page body was not the expected JSON structure
    MalformedPayload { message: String },
}

impl StopReason {
    /// Short label used for logging and run statistics
    pub fn label(&self) -> &'static str {
        match self {
            Self::StaleReview { .. } => "stale_review",
            Self::LastPage => "last_page",
            Self::PageLimit { .. } => "page_limit",
            Self::UnrecognizedDate { .. } => "unrecognized_date",
            Self::FetchFailed { .. } => "fetch_failed",
            Self::MalformedPayload { .. } => "malformed_payload",
        }
    }

    /// Returns true if the chain ended because something went wrong
    pub fn is_error(&self) -> bool {
        matches!(self, Self::FetchFailed { .. } | Self::MalformedPayload { .. })
    }

    /// Returns true if the chain ended on the recency cutoff or by running out of pages
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::StaleReview { .. } | Self::LastPage)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleReview { date } => write!(f, "reached review dated {}", date),
            Self::LastPage => write!(f, "no more pages"),
            Self::PageLimit { pages } => write!(f, "page limit of {} reached", pages),
            Self::UnrecognizedDate { text } => write!(f, "unrecognized date format '{}'", text),
            Self::FetchFailed { message } => write!(f, "fetch failed: {}", message),
            Self::MalformedPayload { message } => write!(f, "malformed payload: {}", message),
        }
    }
}

/// Current state of a restaurant's review chain
#[derive(Debug, Clone, PartialEq)]
pub enum ChainState {
    /// Waiting for the given page to arrive
    Fetching(u32),

    /// Normalizing and emitting the reviews of the page just fetched
    Emitting,

    /// Terminal: no further requests are issued for this restaurant
    Stopped(StopReason),
}

impl ChainState {
    /// Initial state of every chain
    pub fn initial() -> Self {
        Self::Fetching(1)
    }

    /// Returns true if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped(_))
    }

    /// Returns the page to request next, if the chain is fetching
    pub fn page_to_fetch(&self) -> Option<u32> {
        match self {
            Self::Fetching(page) => Some(*page),
            _ => None,
        }
    }

    /// Returns the stop reason of a terminal state
    pub fn stop_reason(&self) -> Option<&StopReason> {
        match self {
            Self::Stopped(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for ChainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetching(page) => write!(f, "fetching(page {})", page),
            Self::Emitting => write!(f, "emitting"),
            Self::Stopped(reason) => write!(f, "stopped({})", reason.label()),
        }
    }
}
