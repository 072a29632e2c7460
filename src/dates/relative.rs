use crate::dates::DateError;
use chrono::{Months, NaiveDate, NaiveDateTime, TimeDelta};

/// Spelled-out counts the platform uses in place of digits
const NUMBER_WORDS: &[(&str, u32)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
];

/// Granularity of a relative date expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Month,
}

impl TimeUnit {
    /// Parses a singular or plural unit word ("hour", "hours")
    pub fn parse(word: &str) -> Option<Self> {
        let singular = word.strip_suffix('s').unwrap_or(word);
        match singular {
            "second" => Some(Self::Second),
            "minute" => Some(Self::Minute),
            "hour" => Some(Self::Hour),
            "day" => Some(Self::Day),
            "month" => Some(Self::Month),
            _ => None,
        }
    }

    /// Subtracts `count` units from `now` and truncates to the calendar date
    ///
    /// Seconds never move the date. Months use calendar-aware subtraction,
    /// clamping to the last day of shorter months.
    fn subtract(self, now: NaiveDateTime, count: u32) -> Option<NaiveDate> {
        let count_i64 = i64::from(count);
        let shifted = match self {
            Self::Second => return Some(now.date()),
            Self::Month => return now.date().checked_sub_months(Months::new(count)),
            Self::Minute => now.checked_sub_signed(TimeDelta::try_minutes(count_i64)?)?,
            Self::Hour => now.checked_sub_signed(TimeDelta::try_hours(count_i64)?)?,
            Self::Day => now.checked_sub_signed(TimeDelta::try_days(count_i64)?)?,
        };
        Some(shifted.date())
    }
}

/// Converts a relative date expression into an absolute calendar date
///
/// # Accepted Forms
///
/// | Expression | Result |
/// |------------|--------|
/// | `yesterday` | now - 1 day |
/// | `today`, `N second(s) [ago]` | now |
/// | `N minute(s) [ago]` | now - N minutes |
/// | `N hour(s) [ago]` | now - N hours |
/// | `N day(s) [ago]` | now - N days |
/// | `N month(s) [ago]` | now - N calendar months |
///
/// `N` is a decimal numeral or a word from "one" to "twelve". Matching is
/// case-insensitive and ignores surrounding whitespace.
///
/// # Arguments
///
/// * `text` - The relative expression as rendered by the platform
/// * `now` - Reference instant of the crawl
///
/// # Returns
///
/// * `Ok(NaiveDate)` - The absolute date, never later than `now`
/// * `Err(DateError::UnrecognizedFormat)` - The text is outside the vocabulary
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use zomato_scout::dates::normalize_relative_date;
///
/// let now = NaiveDate::from_ymd_opt(2024, 1, 10)
///     .unwrap()
///     .and_hms_opt(1, 30, 0)
///     .unwrap();
/// let date = normalize_relative_date("  Two Hours ago ", now).unwrap();
/// assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
/// ```
pub fn normalize_relative_date(text: &str, now: NaiveDateTime) -> Result<NaiveDate, DateError> {
    let lowered = text.trim().to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    let unrecognized = || DateError::UnrecognizedFormat(text.trim().to_string());

    match tokens.as_slice() {
        ["yesterday"] => now.date().pred_opt().ok_or_else(unrecognized),
        ["today"] => Ok(now.date()),
        [count, unit] | [count, unit, "ago"] => {
            let unit = TimeUnit::parse(unit).ok_or_else(unrecognized)?;
            let count = parse_count(count).ok_or_else(unrecognized)?;
            unit.subtract(now, count).ok_or_else(unrecognized)
        }
        _ => Err(unrecognized()),
    }
}

/// Parses a decimal numeral or a spelled-out number word
fn parse_count(token: &str) -> Option<u32> {
    if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
        return token.parse().ok();
    }

    NUMBER_WORDS
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, value)| *value)
}
