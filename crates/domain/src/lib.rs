//! # StopLLMs Domain
//!
//! Business domain types and models for the StopLLMs interception core.
//!
//! This crate contains:
//! - Domain data types (LogEntry, GatePolicy, Session, etc.)
//! - Domain error types and Result definitions
//! - Domain constants (storage keys, caps, monitored-domain list)
//!
//! ## Architecture
//! - No dependencies on other StopLLMs crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
