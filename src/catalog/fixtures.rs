//! Request payloads used by the create-product checks and the load run.
//!
//! Every invalid group is expected to be rejected by the API; the accepted
//! status codes travel with the group.

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use super::product::{NewProduct, STATUS_BAD_REQUEST, STATUS_PAYLOAD_TOO_LARGE};
use crate::client::Payload;

const LARGE_LEN: usize = 500_000;

pub static LARGE_TITLE: Lazy<String> = Lazy::new(|| "A".repeat(LARGE_LEN));

pub static LARGE_IMAGE_URL: Lazy<String> =
    Lazy::new(|| format!("https://{}.com", "a".repeat(LARGE_LEN)));

/// `10^500` as a JSON number literal. Too wide for `f64`, so it never goes
/// through `serde_json::Value`.
pub static LARGE_PRICE_LITERAL: Lazy<String> = Lazy::new(|| format!("1{}", "0".repeat(500)));

/// The product body used by the load run unless configured otherwise.
pub fn canonical_product() -> Value {
    json!({
        "title": "Valid Product",
        "price": 20.5,
        "description": "Test",
        "image": "https://i.pravatar.cc",
        "category": "electronics",
    })
}

/// Bodies the API must accept and echo back with a fresh id.
pub fn valid_products() -> Vec<NewProduct> {
    vec![
        NewProduct::new("Valid Product", 20.5, "Test", "https://i.pravatar.cc", "electronics"),
        NewProduct::new("Another Product", 15.0, "Another test", "https://i.pravatar.cc", "furniture"),
    ]
}

/// Canonical product with one field replaced.
fn with_field(key: &str, value: Value) -> Value {
    let mut body = canonical_product();
    body[key] = value;
    body
}

#[derive(Debug, Clone)]
pub struct InvalidGroup {
    pub name: &'static str,
    pub accepted_statuses: &'static [u16],
    pub payloads: Vec<Payload>,
}

impl InvalidGroup {
    fn rejected(name: &'static str, payloads: Vec<Value>) -> Self {
        Self {
            name,
            accepted_statuses: &[STATUS_BAD_REQUEST],
            payloads: payloads.into_iter().map(Payload::Json).collect(),
        }
    }
}

pub fn invalid_groups() -> Vec<InvalidGroup> {
    let mut groups = Vec::with_capacity(9);

    let mut invalid_json = InvalidGroup::rejected(
        "invalid_json",
        vec![json!(""), json!("Not a JSON"), json!(12345), json!([])],
    );
    invalid_json.payloads.insert(0, Payload::Empty);
    groups.push(invalid_json);

    groups.push(InvalidGroup::rejected(
        "missing_fields",
        vec![
            json!({"title": null, "price": null, "description": null, "image": null, "category": null}),
            json!({"title": "Missing Price"}),
            json!({"price": 20.5}),
            json!({"title": "Valid", "price": 20.5, "description": "Test", "image": "https://i.pravatar.cc"}),
        ],
    ));

    groups.push(InvalidGroup::rejected(
        "wrong_data_types",
        vec![
            with_field("price", json!("string")),
            with_field("category", json!(123)),
            with_field("price", Value::Null),
        ],
    ));

    groups.push(InvalidGroup::rejected(
        "invalid_field_values",
        vec![
            with_field("title", json!("")),
            with_field("description", json!("")),
            with_field("image", json!("")),
            with_field("image", json!("invalid_url")),
            with_field("category", json!("")),
        ],
    ));

    groups.push(InvalidGroup::rejected(
        "invalid_price_values",
        vec![with_field("price", json!(-10)), with_field("price", json!(0))],
    ));

    groups.push(InvalidGroup::rejected(
        "unexpected_fields",
        vec![json!({"unexpected_field": "random value"}), {
            let mut body = canonical_product();
            body["extra_field"] = json!("Not allowed");
            body
        }],
    ));

    groups.push(InvalidGroup {
        name: "large_values",
        accepted_statuses: &[STATUS_PAYLOAD_TOO_LARGE, STATUS_BAD_REQUEST],
        payloads: vec![
            Payload::Json(with_field("title", json!(LARGE_TITLE.as_str()))),
            Payload::Raw(format!(
                r#"{{"title":"Valid","price":{},"description":"Test","image":"https://i.pravatar.cc","category":"electronics"}}"#,
                LARGE_PRICE_LITERAL.as_str()
            )),
            Payload::Json(with_field("image", json!(LARGE_IMAGE_URL.as_str()))),
        ],
    });

    groups.push(InvalidGroup::rejected(
        "invalid_image_formats",
        vec![
            with_field("image", json!("https://example.com/image.txt")),
            with_field("image", json!("https://example.com/image.mp3")),
            with_field("image", json!("https://example.com/image.exe")),
            with_field("image", json!("data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAUA")),
        ],
    ));

    groups.push(InvalidGroup::rejected(
        "security_attempts",
        vec![
            with_field("title", json!("' OR 1=1 --")),
            with_field("title", json!("<script>alert('XSS')</script>")),
            with_field("image", json!("https://evil.com/virus.js")),
            with_field("price", json!("DROP TABLE products;")),
            with_field("price", json!("import os; os.system('rm -rf /')")),
            with_field("image", json!("https://www.evil-site.com/malware.png")),
        ],
    ));

    groups
}

/// Ids that must not resolve to a product.
pub fn false_ids() -> Vec<String> {
    ["-1", "0", "10000", "abc", "!@#"].iter().map(|s| s.to_string()).collect()
}

/// Ids that must not be deletable, given the next free id in the catalog.
pub fn undeletable_ids(next_id: i64) -> Vec<String> {
    vec![
        (next_id + 99_999).to_string(),
        "-1".to_string(),
        "abc".to_string(),
        "!@#".to_string(),
    ]
}
