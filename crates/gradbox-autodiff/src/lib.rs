//! Define-by-run reverse-mode automatic differentiation.
//!
//! Calling a function on variables records the call in a [`Graph`] as a side
//! effect; calling [`Variable::backward`] on a result replays the recorded
//! calls in reverse and fills in the gradient of every variable it depends
//! on.
//!
//! # Architecture
//!
//! The engine is built around four components:
//!
//! 1. **Graph**: Arena owning every variable and function node
//! 2. **Function**: Contract for differentiable operators
//! 3. **Operations**: Square, exponential and addition
//! 4. **Backward**: Generation-ordered backpropagation scheduler
//!
//! # Example
//!
//! ```
//! use gradbox_autodiff::prelude::*;
//! use gradbox_core::scalar;
//!
//! let graph = Graph::new();
//! let x = graph.variable(scalar(2.0))?;
//! let a = square(x)?;
//! let y = add(square(a)?, square(a)?)?;
//! y.backward()?;
//!
//! assert_eq!(y.item(), Some(32.0));
//! assert_eq!(x.grad_item(), Some(64.0));
//! # Ok::<(), gradbox_core::GradError>(())
//! ```

pub mod backward;
pub mod function;
pub mod graph;
pub mod numerical;
pub mod ops;

// Re-export key types
pub use backward::backward;
pub use function::{ForwardOutput, Function};
pub use graph::{FunctionId, FunctionInfo, Graph, Output, Variable, VariableId};
pub use numerical::numerical_diff;
pub use ops::{add, exp, square, Add, Exp, Square};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::function::{ForwardOutput, Function};
    pub use crate::graph::{FunctionId, FunctionInfo, Graph, Output, Variable, VariableId};
    pub use crate::numerical::numerical_diff;
    pub use crate::ops::{add, exp, square, Add, Exp, Square};
}
