//! Configuration model for forkline.
//!
//! This module defines the Config struct that represents `forkline.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! documented defaults for every field, and validation of config values.

mod model;
mod operations;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::{CONFIG_FILE_NAME, Config};
pub use operations::BASE_URL_ENV;
pub use types::{BackendSettings, NativeSettings, PlannerSettings};
