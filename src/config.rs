use figment::{providers::{Env, Format, Toml}, Figment};
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use validator::{Validate, ValidationError};

use crate::catalog::fixtures;
use crate::error::Result;
use crate::load::Schedule;
use crate::telemetry::LogFormat;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const CONFIG_PATH_ENV: &str = "CATALOG_CONFIG";
pub const ENV_PREFIX: &str = "CATALOG__";

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub target: TargetConfig,
    #[validate(nested)]
    pub load: LoadConfig,
    #[validate(nested)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct TargetConfig {
    #[validate(url)]
    pub base_url: String,
    pub products_path: String,
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl TargetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn products_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.products_path
        )
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fakestoreapi.com".to_string(),
            products_path: "/products".to_string(),
            timeout_secs: 10,
            user_agent: concat!("catalog-harness/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LoadMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_load_window"))]
pub struct LoadConfig {
    pub method: LoadMethod,
    /// Overrides `target.products_path` for the load run.
    pub path: Option<String>,
    pub payload: serde_json::Value,
    #[validate(range(min = 1, message = "total_requests must be at least 1"))]
    pub total_requests: usize,
    #[validate(range(min = 1, message = "concurrency must be at least 1"))]
    pub concurrency: usize,
    #[validate(range(min = 0.0, max = 1.0, message = "min_success_ratio must be within [0, 1]"))]
    pub min_success_ratio: f64,
    #[validate(range(min = 100, max = 599))]
    pub expected_status: u16,
    pub schedule: Schedule,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            method: LoadMethod::Post,
            path: None,
            payload: fixtures::canonical_product(),
            total_requests: 100,
            concurrency: 10,
            min_success_ratio: 0.9,
            expected_status: 200,
            schedule: Schedule::Pool,
        }
    }
}

fn validate_load_window(load: &LoadConfig) -> std::result::Result<(), ValidationError> {
    if load.concurrency > load.total_requests {
        let mut err = ValidationError::new("concurrency_exceeds_total");
        err.message = Some("concurrency must not exceed total_requests".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct RunConfig {
    /// Suite selector, resolved by [`crate::conformance::Suite::resolve`].
    /// Menu numbers arrive from the environment as integers.
    #[serde(deserialize_with = "scalar_selector")]
    pub suite: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub sample_percent: u8,
    #[validate(range(min = 1, max = 100))]
    pub negative_sample_percent: u8,
    pub log_format: LogFormat,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            suite: None,
            sample_percent: 100,
            negative_sample_percent: 5,
            log_format: LogFormat::Json,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Selector {
    Name(String),
    Number(i64),
}

fn scalar_selector<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Selector>::deserialize(deserializer)?.map(|selector| match selector {
        Selector::Name(name) => name,
        Selector::Number(number) => number.to_string(),
    }))
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_figment(Self::figment(&path))
    }

    pub fn figment(path: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }
}
