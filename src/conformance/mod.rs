//! Functional checks against the catalog API plus suite selection.

pub mod report;
pub mod schema;
pub mod suites;

pub use report::*;
pub use schema::*;
pub use suites::*;

use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::warn;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum Suite {
    #[strum(to_string = "get-product", serialize = "1")]
    GetProduct,
    #[strum(to_string = "create-product", serialize = "2")]
    CreateProduct,
    #[strum(to_string = "delete-product", serialize = "3")]
    DeleteProduct,
    #[strum(to_string = "list-products", serialize = "4")]
    ListProducts,
    #[strum(to_string = "load", serialize = "5")]
    Load,
}

pub const SELECT_ALL: [&str; 2] = ["all", "6"];

impl Suite {
    /// Turns the configured selector into the suites to run. Anything missing
    /// or unrecognised selects every suite.
    pub fn resolve(selection: Option<&str>) -> Vec<Suite> {
        let Some(raw) = selection.map(str::trim).filter(|s| !s.is_empty()) else {
            warn!("no suite selected; running all suites");
            return Suite::iter().collect();
        };
        if SELECT_ALL.iter().any(|all| all.eq_ignore_ascii_case(raw)) {
            return Suite::iter().collect();
        }
        match raw.parse::<Suite>() {
            Ok(suite) => vec![suite],
            Err(_) => {
                warn!(selection = raw, "unknown suite selection; running all suites");
                Suite::iter().collect()
            }
        }
    }
}
