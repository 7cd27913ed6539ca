//! EPTS diagnostics and error handling
//!
//! This crate provides the error handling infrastructure shared by the
//! calculation engine and the cohort composition algebra: structured error
//! codes, source locations for composition strings, and diagnostic reporting.

mod error;
mod error_code;
mod span;

pub use error::*;
pub use error_code::*;
pub use span::*;

/// Result type for EPTS operations
pub type Result<T> = std::result::Result<T, EptsError>;
