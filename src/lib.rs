pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod parser;
pub mod store;
pub mod tag;

pub use error::{ConvertError, Result};

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
