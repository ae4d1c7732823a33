pub mod config;
pub mod error;
pub mod flags;
pub mod io;
pub mod marketplace;
pub mod openapi;
pub mod paths;
pub mod plugin;
pub mod registry;
pub mod secrets;
pub mod types;

pub use error::{MarketError, Result};
