pub mod fixtures;
pub mod product;

pub use product::*;
