//! Wiremock stand-in for the catalog API.
#![allow(dead_code)]

use catalog_harness::catalog::CONTENT_TYPE_JSON;
use catalog_harness::client::CatalogClient;
use catalog_harness::config::Config;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};


pub fn json_response(status: u16, body: &Value) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .set_body_bytes(body.to_string().into_bytes())
        .insert_header("content-type", CONTENT_TYPE_JSON)
}

pub fn product(id: i64, base: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Product {id}"),
        "price": 10.5 + id as f64,
        "description": "A product used by the harness tests",
        "category": "electronics",
        "image": format!("{base}/img/{id}.jpg"),
        "rating": {"rate": 4.1, "count": 120}
    })
}

fn last_segment_id(req: &Request) -> Option<i64> {
    req.url.path().rsplit('/').next()?.parse().ok()
}

struct ProductById(Vec<Value>);

impl Respond for ProductById {
    fn respond(&self, req: &Request) -> ResponseTemplate {
        match last_segment_id(req).and_then(|id| self.0.iter().find(|p| p["id"] == id)) {
            Some(product) => json_response(200, product),
            None => ResponseTemplate::new(404),
        }
    }
}

struct DeleteById(Vec<Value>);

impl Respond for DeleteById {
    fn respond(&self, req: &Request) -> ResponseTemplate {
        match last_segment_id(req).and_then(|id| self.0.iter().find(|p| p["id"] == id)) {
            Some(product) => json_response(200, product),
            None => ResponseTemplate::new(400),
        }
    }
}

struct WrongMethod;

impl Respond for WrongMethod {
    fn respond(&self, req: &Request) -> ResponseTemplate {
        ResponseTemplate::new(405)
            .set_body_bytes(format!("<pre>Cannot POST {}</pre>", req.url.path()).into_bytes())
            .insert_header("content-type", "text/html; charset=utf-8")
    }
}

/// Accepts only well-formed products from trusted image hosts and echoes
/// them back with id 21.
pub struct StrictCreate;

impl StrictCreate {
    fn accepts(body: &Value) -> bool {
        let Some(obj) = body.as_object() else {
            return false;
        };
        let keys_ok = obj.len() == 5
            && ["title", "price", "description", "image", "category"]
                .iter()
                .all(|k| obj.contains_key(*k));
        let text_ok = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == ' '))
        };
        let price_ok = obj.get("price").and_then(Value::as_f64).is_some_and(|p| p > 0.0 && p < 1e9);
        let image_ok = obj
            .get("image")
            .and_then(Value::as_str)
            .is_some_and(|img| img == "https://i.pravatar.cc" || img.starts_with("https://fakestoreapi.com/img/"));
        keys_ok && text_ok("title") && text_ok("description") && text_ok("category") && price_ok && image_ok
    }
}

impl Respond for StrictCreate {
    fn respond(&self, req: &Request) -> ResponseTemplate {
        if req.body.len() > 100_000 {
            return ResponseTemplate::new(413);
        }
        match serde_json::from_slice::<Value>(&req.body) {
            Ok(mut body) if Self::accepts(&body) => {
                body["id"] = json!(21);
                json_response(200, &body)
            }
            _ => ResponseTemplate::new(400),
        }
    }
}

pub struct FakeCatalog {
    pub server: MockServer,
    pub products: Vec<Value>,
    pub prefix: String,
}

impl FakeCatalog {
    /// A well-behaved catalog with `count` products.
    pub async fn start(count: i64) -> Self {
        Self::start_at(count, "").await
    }

    /// Same catalog mounted under a path prefix such as `/api/v1`.
    pub async fn start_at(count: i64, prefix: &str) -> Self {
        let server = MockServer::start().await;
        let products_path = format!("{prefix}/products");
        let product_by_id = format!(r"^{prefix}/products/[^/]+$");
        let products: Vec<Value> = (1..=count).map(|id| product(id, &server.uri())).collect();

        Mock::given(method("GET"))
            .and(path(products_path.as_str()))
            .respond_with(json_response(200, &Value::Array(products.clone())))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(product_by_id.as_str()))
            .respond_with(ProductById(products.clone()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/img/"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(products_path.as_str()))
            .respond_with(StrictCreate)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(product_by_id.as_str()))
            .respond_with(WrongMethod)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path_regex(product_by_id.as_str()))
            .respond_with(DeleteById(products.clone()))
            .mount(&server)
            .await;

        Self {
            server,
            products,
            prefix: prefix.to_string(),
        }
    }

    pub fn config(&self) -> Config {
        let mut cfg = Config::default();
        cfg.target.base_url = format!("{}{}", self.server.uri(), self.prefix);
        cfg.target.timeout_secs = 5;
        cfg.load.total_requests = 10;
        cfg.load.concurrency = 5;
        cfg
    }

    pub fn client(&self) -> CatalogClient {
        CatalogClient::new(&self.config().target).expect("client builds")
    }
}
