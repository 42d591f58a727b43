//! Thin client over the catalog REST API.
//!
//! Every call hands back the raw [`ApiResponse`] so checks can inspect the
//! status, content type and body themselves. Only transport failures are
//! errors here.

use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::RequestBuilder;
use serde_json::Value;
use std::fmt::Display;
use tracing::{debug, warn};

use crate::config::TargetConfig;
use crate::error::{HarnessError, Result};

/// Request body variants. `Raw` is sent with a JSON content type but is not
/// produced by `serde_json`, which lets malformed or oversized literals through.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Json(Value),
    Raw(String),
}

impl Payload {
    pub(crate) fn attach(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Payload::Empty => builder,
            Payload::Json(value) => builder.json(value),
            Payload::Raw(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl ApiResponse {
    async fn read(resp: reqwest::Response) -> Result<Self> {
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.text().await.map_err(HarnessError::Transport)?;
        Ok(Self {
            status,
            content_type,
            body,
        })
    }

    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Builds the shared `reqwest` client with the configured timeout and user agent.
pub fn build_http_client(target: &TargetConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    let agent = HeaderValue::from_str(&target.user_agent)
        .map_err(|e| HarnessError::Config(format!("invalid user_agent: {e}")))?;
    headers.insert(USER_AGENT, agent);
    reqwest::Client::builder()
        .timeout(target.timeout())
        .default_headers(headers)
        .build()
        .map_err(HarnessError::Client)
}

#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    products_url: String,
}

impl CatalogClient {
    pub fn new(target: &TargetConfig) -> Result<Self> {
        Ok(Self::with_client(build_http_client(target)?, target.products_url()))
    }

    pub fn with_client(client: reqwest::Client, products_url: String) -> Self {
        Self {
            client,
            products_url,
        }
    }

    pub fn product_url(&self, id: impl Display) -> String {
        format!("{}/{}", self.products_url, id)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<ApiResponse> {
        let resp = builder.send().await.map_err(HarnessError::Transport)?;
        ApiResponse::read(resp).await
    }

    pub async fn list_products(&self) -> Result<ApiResponse> {
        debug!(url = %self.products_url, "listing products");
        self.send(self.client.get(&self.products_url)).await
    }

    pub async fn get_product(&self, id: impl Display) -> Result<ApiResponse> {
        self.get_url(&self.product_url(id)).await
    }

    pub async fn create_product(&self, payload: &Payload) -> Result<ApiResponse> {
        self.post_to(&self.products_url, payload).await
    }

    pub async fn post_to(&self, url: &str, payload: &Payload) -> Result<ApiResponse> {
        debug!(%url, "POST");
        self.send(payload.attach(self.client.post(url))).await
    }

    pub async fn delete_product(&self, id: impl Display) -> Result<ApiResponse> {
        let url = self.product_url(id);
        debug!(%url, "DELETE");
        self.send(self.client.delete(&url)).await
    }

    pub async fn get_url(&self, url: &str) -> Result<ApiResponse> {
        debug!(%url, "GET");
        self.send(self.client.get(url)).await
    }

    async fn all_product_ids(&self) -> Result<Vec<i64>> {
        let resp = self.list_products().await?;
        if resp.status != 200 {
            warn!(status = resp.status, "failed to fetch products");
            return Err(HarnessError::UnexpectedStatus {
                status: resp.status,
                body: resp.body,
            });
        }
        let ids: Vec<i64> = match resp.json()? {
            Value::Array(items) => items
                .iter()
                .filter_map(|p| p.get("id").and_then(Value::as_i64))
                .collect(),
            _ => Vec::new(),
        };
        if ids.is_empty() {
            return Err(HarnessError::EmptyCatalog);
        }
        Ok(ids)
    }

    /// Random subset holding `percent`% of the catalog ids, never fewer than one.
    pub async fn product_ids(&self, percent: u8) -> Result<Vec<i64>> {
        let mut ids = self.all_product_ids().await?;
        let wanted = sample_size(ids.len(), percent);
        ids.shuffle(&mut rand::thread_rng());
        ids.truncate(wanted);
        Ok(ids)
    }

    /// One past the highest id in the catalog.
    pub async fn next_product_id(&self) -> Result<i64> {
        let ids = self.all_product_ids().await?;
        Ok(ids.into_iter().max().unwrap_or(0) + 1)
    }
}

fn sample_size(len: usize, percent: u8) -> usize {
    (len * usize::from(percent.min(100)) / 100).max(1)
}
