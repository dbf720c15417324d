//! Error types for graph construction and differentiation.
//!
//! Every fallible operation in the workspace returns [`Result`], whose error
//! side is [`GradError`]. Type errors raised while boxing a raw value into a
//! variable are kept in their own [`TypeKind`] enum so callers can match on
//! them without caring about the rest of the taxonomy.

use thiserror::Error;

/// Errors raised when a raw value cannot be stored in a variable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeKind {
    /// The value is neither an array nor empty.
    ///
    /// Bare scalars and plain sequences must be converted to an array
    /// before they can become the value of a variable.
    #[error("{type_name} is not supported")]
    Unsupported {
        /// Name of the rejected type
        type_name: &'static str,
    },
}

/// Errors that can occur while building or differentiating a graph.
#[derive(Debug, Clone, Error)]
pub enum GradError {
    /// A value of the wrong type was used to construct a variable.
    #[error("Type error: {0}")]
    Type(#[from] TypeKind),

    /// A function relies on the default `forward` or `backward`.
    ///
    /// Every operator must override both methods; hitting this error means
    /// the operator implementation is incomplete.
    #[error("{function} does not implement {method}")]
    NotImplemented {
        /// Name of the function
        function: String,
        /// Method that was not overridden
        method: &'static str,
    },

    /// The number of arrays exchanged with a function is wrong.
    ///
    /// Raised when a function is applied to the wrong number of inputs, or
    /// when its backward returns a gradient count that differs from its
    /// input count.
    #[error("Arity mismatch in {function}: expected {expected}, got {actual}")]
    ArityMismatch {
        /// Name of the function
        function: String,
        /// Expected number of arrays
        expected: usize,
        /// Number of arrays actually supplied
        actual: usize,
    },

    /// A variable without a value was used as a function input.
    #[error("{variable} holds no value")]
    EmptyValue {
        /// Display form of the variable handle
        variable: String,
    },

    /// Two gradients with different shapes met during accumulation.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Shape of the gradient already stored
        expected: Vec<usize>,
        /// Shape of the incoming contribution
        actual: Vec<usize>,
    },

    /// A variable handle was used with a graph that did not create it.
    #[error("{variable} does not belong to this graph")]
    ForeignVariable {
        /// Display form of the variable handle
        variable: String,
    },

    /// A configuration value is out of range.
    #[error("Invalid configuration for {parameter} = {value}: {reason}")]
    InvalidConfiguration {
        /// Name of the parameter
        parameter: &'static str,
        /// Rejected value
        value: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl GradError {
    /// Create an Unsupported type error for the named type.
    pub fn unsupported(type_name: &'static str) -> Self {
        Self::Type(TypeKind::Unsupported { type_name })
    }

    /// Create a NotImplemented error for a function method.
    pub fn not_implemented<S: Into<String>>(function: S, method: &'static str) -> Self {
        Self::NotImplemented {
            function: function.into(),
            method,
        }
    }

    /// Create an ArityMismatch error.
    pub fn arity_mismatch<S: Into<String>>(function: S, expected: usize, actual: usize) -> Self {
        Self::ArityMismatch {
            function: function.into(),
            expected,
            actual,
        }
    }

    /// Create an EmptyValue error for a variable.
    pub fn empty_value<V: std::fmt::Display>(variable: V) -> Self {
        Self::EmptyValue {
            variable: variable.to_string(),
        }
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Create a ForeignVariable error for a variable.
    pub fn foreign_variable<V: std::fmt::Display>(variable: V) -> Self {
        Self::ForeignVariable {
            variable: variable.to_string(),
        }
    }

    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<V, S>(parameter: &'static str, value: V, reason: S) -> Self
    where
        V: std::fmt::Display,
        S: Into<String>,
    {
        Self::InvalidConfiguration {
            parameter,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the type error kind, if this is a type error.
    pub fn type_kind(&self) -> Option<&TypeKind> {
        match self {
            Self::Type(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Result type alias for operations that can produce GradError.
pub type Result<T> = std::result::Result<T, GradError>;
