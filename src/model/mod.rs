//! Record types exchanged between the registry, the crawler and the sink
//!
//! - `RestaurantRef`: a crawl target from the restaurant registry
//! - `ReviewEntry` / `ReviewRecord`: a raw review from the platform and its
//!   normalized, storage-ready form
//! - `MenuItemRecord`: one flattened menu item

mod menu;
mod restaurant;
mod review;

pub use menu::MenuItemRecord;
pub use restaurant::RestaurantRef;
pub use review::{ReviewEntry, ReviewRecord};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserializes a string field that upstream APIs sometimes send as a number or null
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(value_to_text).unwrap_or_default())
}

/// Deserializes a numeric field that may arrive as a number, a numeric string, or null
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_f64))
}

/// Renders a scalar JSON value as text; null and containers become empty
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Reads a JSON number or numeric string as `f64`
pub(crate) fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!("abc")), "abc");
        assert_eq!(value_to_text(&json!(18_962_377)), "18962377");
        assert_eq!(value_to_text(&json!(4.5)), "4.5");
        assert_eq!(value_to_text(&Value::Null), "");
        assert_eq!(value_to_text(&json!({"a": 1})), "");
    }

    #[test]
    fn test_value_to_f64() {
        assert_eq!(value_to_f64(&json!(4)), Some(4.0));
        assert_eq!(value_to_f64(&json!(" 3.5 ")), Some(3.5));
        assert_eq!(value_to_f64(&json!("n/a")), None);
        assert_eq!(value_to_f64(&Value::Null), None);
    }
}
