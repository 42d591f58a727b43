//! Product model as served by the catalog API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Keys every product object must carry.
pub const EXPECTED_PRODUCT_KEYS: [&str; 6] = ["id", "title", "price", "description", "category", "image"];

pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// Body returned when an id does not resolve to a product.
pub const TEXT_INVALID_ID: &str = "";

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_METHOD_NOT_ALLOWED: u16 = 405;
pub const STATUS_PAYLOAD_TOO_LARGE: u16 = 413;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub rate: f64,
    pub count: u64,
}

/// Body of a create request. The server assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub price: f64,
    pub description: String,
    pub image: String,
    pub category: String,
}

impl NewProduct {
    pub fn new(title: &str, price: f64, description: &str, image: &str, category: &str) -> Self {
        Self {
            title: title.to_string(),
            price,
            description: description.to_string(),
            image: image.to_string(),
            category: category.to_string(),
        }
    }

    /// Fields the server changed when it created `created` from this body.
    pub fn differences(&self, created: &Product) -> Vec<String> {
        [
            mismatch("title", &self.title, &created.title),
            mismatch("price", &self.price, &created.price),
            mismatch("description", &self.description, &created.description),
            mismatch("image", &self.image, &created.image),
            mismatch("category", &self.category, &created.category),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

fn mismatch<T: PartialEq + fmt::Display>(key: &str, sent: &T, got: &T) -> Option<String> {
    (sent != got).then(|| format!("mismatch in {key}: expected {sent}, got {got}"))
}
