//! Feature-flag tooling: config scaffolding and test-coverage heuristics.

pub mod config;
pub mod coverage;

pub use config::{FlagConfig, FlagRequest, FlagType};
pub use coverage::{CoverageReport, CoverageStatus, FlagCoverage};
