//! Menu traversal
//!
//! Flattens the `page_data.order.menuList.menus[].menu.categories[].category.items[].item`
//! tree of a restaurant's menu payload into `MenuItemRecord`s. Missing
//! optional fields fall back to defaults, and a malformed wrapper only skips
//! itself, never its siblings.

use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::model::{value_to_f64, value_to_text, MenuItemRecord, RestaurantRef};
use crate::output::RecordSink;
use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;

/// Tag text marking an item as a bestseller
pub const BESTSELLER_TAG: &str = "BESTSELLER";

/// The payload has no menus to traverse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("menus is missing or empty in the response")]
pub struct MissingMenus;

/// Lazily extracts flattened item records from a menu payload
///
/// # Arguments
///
/// * `payload` - The menu API response body
/// * `restaurant` - The restaurant the menu belongs to
/// * `crawl_date` - Day of the crawl, stamped on every record
///
/// # Returns
///
/// * `Ok(iterator)` - Item records in menu, category, item order
/// * `Err(MissingMenus)` - The menu list is absent or empty
pub fn extract_menu_items<'a>(
    payload: &'a Value,
    restaurant: &'a RestaurantRef,
    crawl_date: NaiveDate,
) -> Result<impl Iterator<Item = MenuItemRecord> + 'a, MissingMenus> {
    let menus = payload
        .pointer("/page_data/order/menuList/menus")
        .and_then(Value::as_array)
        .filter(|menus| !menus.is_empty())
        .ok_or(MissingMenus)?;

    let items = menus
        .iter()
        .filter_map(|wrapper| unwrap_object(wrapper, "menu"))
        .flat_map(move |menu| {
            let main_category = text_or(menu, "name", "No Name Found");

            array_field(menu, "categories")
                .iter()
                .filter_map(|wrapper| unwrap_object(wrapper, "category"))
                .flat_map(move |category| {
                    let main_category = main_category.clone();
                    let category_name = text_or(category, "name", "No Category Name");

                    array_field(category, "items")
                        .iter()
                        .filter_map(|wrapper| unwrap_object(wrapper, "item"))
                        .map(move |item| {
                            build_record(item, &main_category, &category_name, restaurant, crawl_date)
                        })
                })
        });

    Ok(items)
}

/// Returns the first tag whose title text is exactly "BESTSELLER"
pub fn find_bestseller_tag(item: &Value) -> Option<String> {
    array_field(item, "tag_objects")
        .iter()
        .filter_map(|tag| tag.pointer("/title/text").and_then(Value::as_str))
        .find(|text| *text == BESTSELLER_TAG)
        .map(str::to_string)
}

fn build_record(
    item: &Value,
    main_category: &str,
    category: &str,
    restaurant: &RestaurantRef,
    crawl_date: NaiveDate,
) -> MenuItemRecord {
    let (rating, rating_count) = match item.get("rating") {
        Some(rating) if rating.as_object().is_some_and(|r| !r.is_empty()) => {
            let value = rating.get("value").map(value_to_text).unwrap_or_default();
            let count = rating
                .get("total_rating_text")
                .map(value_to_text)
                .and_then(|text| text.split_whitespace().next().map(str::to_string))
                .unwrap_or_default();
            (value, count)
        }
        _ => (String::new(), String::new()),
    };

    let item_name = text_or(item, "name", "No Item Name");
    let price = item_price(item, &item_name);

    MenuItemRecord {
        main_category: main_category.to_string(),
        category: category.to_string(),
        item_name,
        price,
        rating,
        rating_count,
        tag: find_bestseller_tag(item),
        date: crawl_date,
        competitor_id: restaurant.competitor_id.clone(),
        brand_name: restaurant.brand_name.clone(),
        city: restaurant.city.clone(),
        subzone: restaurant.sub_zone.clone(),
        res_id: restaurant.res_id.clone(),
        platform: restaurant.platform.clone(),
    }
}

/// Reads a numeric price; text that is not a number is dropped
fn item_price(item: &Value, item_name: &str) -> Option<f64> {
    let raw = item.get("price")?;
    let price = value_to_f64(raw);
    if price.is_none() && !raw.is_null() {
        tracing::debug!("Dropping non-numeric price {} of item '{}'", raw, item_name);
    }
    price
}

/// Returns `wrapper[key]` if it is an object, logging and skipping otherwise
fn unwrap_object<'v>(wrapper: &'v Value, key: &str) -> Option<&'v Value> {
    let inner = wrapper.get(key).filter(|value| value.is_object());
    if inner.is_none() {
        tracing::debug!("Skipping malformed {} entry: {}", key, wrapper);
    }
    inner
}

fn array_field<'v>(value: &'v Value, key: &str) -> &'v [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn text_or(value: &Value, key: &str, default: &str) -> String {
    match value.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(field) => value_to_text(field),
    }
}

/// Outcome of one restaurant's menu crawl
#[derive(Debug, Clone, PartialEq)]
pub struct MenuReport {
    pub res_id: String,
    pub items_emitted: usize,
    /// Set when the menu could not be resolved, fetched, or traversed
    pub error: Option<String>,
}

/// Resolves, fetches and flattens one restaurant's menu into the sink
///
/// Never fails: errors are logged and reported in the returned `MenuReport`.
pub async fn crawl_restaurant_menu(
    fetcher: &Fetcher,
    restaurant: &RestaurantRef,
    crawl_date: NaiveDate,
    sink: &RecordSink<MenuItemRecord>,
) -> MenuReport {
    let res_id = restaurant.res_id.clone();

    match fetch_menu_items(fetcher, restaurant, crawl_date).await {
        Ok(items) => {
            let items_emitted = items.len();
            tracing::info!(res_id = %res_id, items = items_emitted, "Menu extracted");
            sink.extend(items);
            MenuReport {
                res_id,
                items_emitted,
                error: None,
            }
        }
        Err(e) => {
            tracing::error!(res_id = %res_id, "Menu crawl failed: {}", e);
            MenuReport {
                res_id,
                items_emitted: 0,
                error: Some(e.to_string()),
            }
        }
    }
}

async fn fetch_menu_items(
    fetcher: &Fetcher,
    restaurant: &RestaurantRef,
    crawl_date: NaiveDate,
) -> Result<Vec<MenuItemRecord>, FetchError> {
    let url = fetcher.resolve_menu_url(&restaurant.res_id).await?;
    let payload = fetcher.fetch_menu_payload(&url).await?;

    let items = extract_menu_items(&payload, restaurant, crawl_date)
        .map_err(|e| FetchError::Malformed {
            url: url.to_string(),
            message: e.to_string(),
        })?
        .collect();
    Ok(items)
}
