//! Configuration module for charagen
//!
//! Provides types and parsing for `charagen.toml` project configuration.

pub mod loader;
pub mod schema;

pub use schema::*;
