//! Core types for the gradbox automatic differentiation engine.
//!
//! This crate holds everything the graph engine needs that is not the graph
//! itself: the array primitive values and gradients are stored in, the error
//! taxonomy, and configuration for backward passes.
//!
//! # Modules
//!
//! - [`array`]: Array alias, raw values and scalar coercion
//! - [`config`]: Backward pass and numerical differentiation settings
//! - [`error`]: Error types and the crate `Result` alias

pub mod array;
pub mod config;
pub mod error;

// Re-export commonly used items at the crate root
pub use ndarray;
pub use array::{as_array, ones_like, scalar, zeros_like, Array, RawValue};
pub use config::{BackwardConfig, BackwardConfigBuilder, BackwardOrder, NumericalDiffConfig};
pub use error::{GradError, Result, TypeKind};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use gradbox_core::prelude::*;
///
/// let value = as_array(RawValue::from(2.0));
/// assert!(matches!(value, RawValue::Array(_)));
/// ```
pub mod prelude {
    pub use crate::array::{as_array, ones_like, scalar, zeros_like, Array, RawValue};
    pub use crate::config::{BackwardConfig, BackwardOrder, NumericalDiffConfig};
    pub use crate::error::{GradError, Result, TypeKind};
}
