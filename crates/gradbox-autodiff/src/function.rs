//! The contract every differentiable function implements.
//!
//! A function is instantiated once per call and handed to
//! [`Graph::apply`](crate::graph::Graph::apply), which runs `forward`, boxes
//! the results into new variables and records the function in the graph.
//! During the backward pass the scheduler calls `backward` with the values
//! the function saw in the forward pass and the gradients of its outputs.

use gradbox_core::{Array, GradError, RawValue, Result};
use std::fmt::Debug;

/// Raw results of a forward computation.
///
/// Returning a single value and returning a one-element tuple are
/// equivalent; [`ForwardOutput::into_vec`] normalizes both.
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardOutput {
    /// One result.
    Single(RawValue),
    /// Several results, in output order.
    Tuple(Vec<RawValue>),
}

impl ForwardOutput {
    /// Returns the results as a sequence.
    pub fn into_vec(self) -> Vec<RawValue> {
        match self {
            Self::Single(value) => vec![value],
            Self::Tuple(values) => values,
        }
    }
}

impl From<Array> for ForwardOutput {
    fn from(array: Array) -> Self {
        Self::Single(RawValue::Array(array))
    }
}

impl From<f64> for ForwardOutput {
    fn from(value: f64) -> Self {
        Self::Single(RawValue::from(value))
    }
}

impl From<RawValue> for ForwardOutput {
    fn from(value: RawValue) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<Array>> for ForwardOutput {
    fn from(arrays: Vec<Array>) -> Self {
        Self::Tuple(arrays.into_iter().map(RawValue::Array).collect())
    }
}

/// A differentiable computation recorded in the graph.
///
/// Both `forward` and `backward` have default implementations that fail
/// with [`GradError::NotImplemented`]; every operator must override them.
pub trait Function: Debug {
    /// Returns the name of this function.
    fn name(&self) -> &str;

    /// Number of inputs the function consumes, if fixed.
    ///
    /// [`Graph::apply`](crate::graph::Graph::apply) rejects calls with a
    /// different number of inputs.
    fn arity(&self) -> Option<usize> {
        None
    }

    /// Computes the raw outputs from the raw input values.
    ///
    /// Must not depend on anything but `xs`.
    fn forward(&self, _xs: &[Array]) -> Result<ForwardOutput> {
        Err(GradError::not_implemented(self.name(), "forward"))
    }

    /// Computes the gradient with respect to each input.
    ///
    /// # Arguments
    /// * `xs` - The input values recorded in the forward pass
    /// * `gys` - The gradient of each output, in output order
    ///
    /// # Returns
    /// One gradient per input, in input order
    fn backward(&self, _xs: &[Array], _gys: &[Array]) -> Result<Vec<Array>> {
        Err(GradError::not_implemented(self.name(), "backward"))
    }
}
