//! Minimal define-by-run automatic differentiation.
//!
//! `gradbox` records a computation graph while ordinary function calls run
//! and differentiates it in reverse on demand. This crate re-exports the
//! pieces from [`gradbox_core`] and [`gradbox_autodiff`].
//!
//! # Example
//!
//! ```
//! use gradbox::prelude::*;
//!
//! let graph = Graph::new();
//! let x = graph.variable(scalar(0.5))?;
//! let y = square(exp(square(x)?)?)?;
//! y.backward()?;
//!
//! let expected = 4.0 * 0.5 * 0.5_f64.exp();
//! assert!((x.grad_item().unwrap() - expected).abs() < 1e-12);
//! # Ok::<(), GradError>(())
//! ```

pub use ndarray;

pub use gradbox_autodiff::{
    add, backward, exp, numerical_diff, square, Add, Exp, ForwardOutput, Function, FunctionId,
    FunctionInfo, Graph, Output, Square, Variable, VariableId,
};
pub use gradbox_core::{
    as_array, ones_like, scalar, zeros_like, Array, BackwardConfig, BackwardOrder, GradError,
    NumericalDiffConfig, RawValue, Result, TypeKind,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use gradbox_autodiff::prelude::*;
    pub use gradbox_core::prelude::*;
}
