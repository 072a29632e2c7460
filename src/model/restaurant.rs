use crate::model::lenient_string;
use serde::{Deserialize, Serialize};

/// A crawl target sourced from the restaurant registry
///
/// Registry rows carry identifiers as either numbers or strings; both are
/// held as text here. The value is immutable for the duration of a crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantRef {
    #[serde(default, deserialize_with = "lenient_string")]
    pub res_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub competitor_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub brand_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sub_zone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub platform: String,
}

impl RestaurantRef {
    /// Returns true if the row identifies a restaurant that can be crawled
    pub fn has_res_id(&self) -> bool {
        !self.res_id.trim().is_empty()
    }
}
