//! Numerical differentiation for checking analytic gradients.

use crate::graph::Variable;
use gradbox_core::{Array, GradError, NumericalDiffConfig, Result};

/// Approximates the derivative of `f` at `x` by central differences.
///
/// Evaluates `f` on two fresh leaves holding `x - eps` and `x + eps` in the
/// graph of `x` and returns `(f(x + eps) - f(x - eps)) / (2 eps)`
/// element-wise. `x` itself and its gradient are left untouched.
pub fn numerical_diff<'g, F>(f: F, x: Variable<'g>, config: &NumericalDiffConfig) -> Result<Array>
where
    F: Fn(Variable<'g>) -> Result<Variable<'g>>,
{
    let graph = x.graph();
    let value = x.value().ok_or_else(|| GradError::empty_value(x.id()))?;

    let x0 = graph.variable(&value - config.eps)?;
    let x1 = graph.variable(&value + config.eps)?;
    let y0 = f(x0)?;
    let y1 = f(x1)?;

    let y0 = y0.value().ok_or_else(|| GradError::empty_value(y0.id()))?;
    let y1 = y1.value().ok_or_else(|| GradError::empty_value(y1.id()))?;
    if y0.shape() != y1.shape() {
        return Err(GradError::shape_mismatch(y0.shape(), y1.shape()));
    }
    Ok((y1 - y0) / (2.0 * config.eps))
}
