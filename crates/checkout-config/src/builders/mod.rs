//! Builders for constructing configurations in tests and demos.

pub mod config;

pub use config::ConfigBuilder;
