//! Shape and type rules for product objects.

use serde_json::{Map, Value};

use crate::catalog::EXPECTED_PRODUCT_KEYS;

/// Object with every expected key. Returns the violations found.
pub fn validate_product_shape(value: &Value) -> Vec<String> {
    let Some(obj) = value.as_object() else {
        return vec!["response should be a JSON object".to_string()];
    };
    EXPECTED_PRODUCT_KEYS
        .iter()
        .filter(|key| !obj.contains_key(**key))
        .map(|key| format!("missing key `{key}`"))
        .collect()
}

pub fn validate_product_types(value: &Value) -> Vec<String> {
    let Some(obj) = value.as_object() else {
        return vec!["response should be a JSON object".to_string()];
    };
    let mut problems = Vec::new();

    if !obj.get("id").is_some_and(is_integer) {
        problems.push("id should be an integer".to_string());
    }
    for key in ["title", "description", "category"] {
        if non_empty_str(obj, key).is_none() {
            problems.push(format!("{key} should be a non-empty string"));
        }
    }
    match obj.get("price").and_then(Value::as_f64) {
        Some(price) if price > 0.0 => {}
        _ => problems.push("price should be a positive number".to_string()),
    }
    if !non_empty_str(obj, "image").is_some_and(|img| img.starts_with("http")) {
        problems.push("image should be a URL starting with http".to_string());
    }

    match obj.get("rating").and_then(Value::as_object) {
        None => problems.push("rating should be an object".to_string()),
        Some(rating) => {
            match rating.get("rate").and_then(Value::as_f64) {
                Some(rate) if rate >= 0.0 => {}
                Some(rate) => problems.push(format!("rate should be >= 0, got {rate}")),
                None => problems.push("rate should be a number".to_string()),
            }
            match rating.get("count") {
                Some(count) if count.is_u64() => {}
                Some(count) if count.is_i64() => {
                    problems.push(format!("count should be >= 0, got {count}"))
                }
                _ => problems.push("count should be an integer".to_string()),
            }
        }
    }

    problems
}

fn is_integer(value: &Value) -> bool {
    value.is_i64() || value.is_u64()
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}
