//! Verification classifier and dashboard aggregator for the carpooling
//! admin console, with a small HTTP service around them.

pub mod app;
pub mod config;
pub mod error;
pub mod records;
pub mod state;
pub mod stats;
pub mod verification;

pub use error::RecordError;
