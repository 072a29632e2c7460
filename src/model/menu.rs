use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One menu item flattened out of the menus -> categories -> items tree
///
/// Field names are the column names of the destination table; note the
/// menu table spells the sub-zone column `subzone`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemRecord {
    pub main_category: String,
    pub category: String,
    pub item_name: String,
    /// Numeric price; a missing, null or non-numeric price (e.g. "Ask staff") is `None`
    pub price: Option<f64>,
    /// Rating value as text, empty when the item has no rating
    pub rating: String,
    /// Leading token of the rating count text ("120 votes" -> "120"), empty when unrated
    pub rating_count: String,
    /// Promotional tag such as "BESTSELLER"
    pub tag: Option<String>,
    /// Day the menu was crawled
    pub date: NaiveDate,
    pub competitor_id: String,
    pub brand_name: String,
    pub city: String,
    pub subzone: String,
    pub res_id: String,
    pub platform: String,
}
