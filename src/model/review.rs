use crate::model::{lenient_f64, lenient_string, RestaurantRef};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A review as it appears in the platform's `entities.REVIEWS` map
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReviewEntry {
    #[serde(rename = "reviewId", default, deserialize_with = "lenient_string")]
    pub review_id: String,

    #[serde(rename = "reviewText", default, deserialize_with = "lenient_string")]
    pub review_text: String,

    #[serde(rename = "ratingV2", default, deserialize_with = "lenient_f64")]
    pub rating: Option<f64>,

    /// Rating label such as "Very Good"
    #[serde(rename = "ratingV2Text", default, deserialize_with = "lenient_string")]
    pub review_type: String,

    /// Relative timestamp text ("3 hours ago")
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: String,
}

/// A normalized review ready for the storage API
///
/// Field names are the column names of the destination table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub review: String,
    pub review_id: String,
    pub rating: Option<f64>,
    pub review_type: String,
    pub review_date: NaiveDate,
    pub competitor_id: String,
    pub brand_name: String,
    pub city: String,
    pub sub_zone: String,
    pub platform: String,
    pub res_id: String,
}

impl ReviewRecord {
    /// Builds a record from a platform entry, its normalized date and the restaurant it belongs to
    pub fn from_entry(entry: &ReviewEntry, review_date: NaiveDate, restaurant: &RestaurantRef) -> Self {
        Self {
            review: entry.review_text.clone(),
            review_id: entry.review_id.clone(),
            rating: entry.rating,
            review_type: entry.review_type.clone(),
            review_date,
            competitor_id: restaurant.competitor_id.clone(),
            brand_name: restaurant.brand_name.clone(),
            city: restaurant.city.clone(),
            sub_zone: restaurant.sub_zone.clone(),
            platform: restaurant.platform.clone(),
            res_id: restaurant.res_id.clone(),
        }
    }
}
