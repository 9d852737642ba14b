//! isquestion Core
//!
//! Core types and utilities shared across isquestion components.
//!
//! This crate provides:
//! - The error type and result alias used by every library crate
//! - Classifier labels and the explicit request verdict type

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Classification, Label, OverrideRule, RejectReason, Verdict};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{Classification, Label, OverrideRule, RejectReason, Verdict};
}
