//! Operators for the computation graph.
//!
//! Each operator is a unit struct implementing [`Function`]. The free
//! functions [`square`], [`exp`] and [`add`] create a fresh operator per
//! call and apply it in the graph of their inputs.

use crate::function::{ForwardOutput, Function};
use crate::graph::Variable;
use gradbox_core::{Array, Result};

/// Element-wise square.
#[derive(Debug, Clone, Copy, Default)]
pub struct Square;

impl Function for Square {
    fn name(&self) -> &str {
        "Square"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn forward(&self, xs: &[Array]) -> Result<ForwardOutput> {
        Ok(xs[0].mapv(|x| x.powi(2)).into())
    }

    fn backward(&self, xs: &[Array], gys: &[Array]) -> Result<Vec<Array>> {
        // d/dx x^2 = 2x
        Ok(vec![&xs[0] * &gys[0] * 2.0])
    }
}

/// Element-wise exponential.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exp;

impl Function for Exp {
    fn name(&self) -> &str {
        "Exp"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn forward(&self, xs: &[Array]) -> Result<ForwardOutput> {
        Ok(xs[0].mapv(f64::exp).into())
    }

    fn backward(&self, xs: &[Array], gys: &[Array]) -> Result<Vec<Array>> {
        Ok(vec![xs[0].mapv(f64::exp) * &gys[0]])
    }
}

/// Element-wise addition.
#[derive(Debug, Clone, Copy, Default)]
pub struct Add;

impl Function for Add {
    fn name(&self) -> &str {
        "Add"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn forward(&self, xs: &[Array]) -> Result<ForwardOutput> {
        Ok((&xs[0] + &xs[1]).into())
    }

    fn backward(&self, _xs: &[Array], gys: &[Array]) -> Result<Vec<Array>> {
        // The output gradient flows unchanged to both operands
        Ok(vec![gys[0].clone(), gys[0].clone()])
    }
}

/// Applies [`Square`] to `x`.
pub fn square(x: Variable<'_>) -> Result<Variable<'_>> {
    x.graph().apply(Square, &[x])?.into_single()
}

/// Applies [`Exp`] to `x`.
pub fn exp(x: Variable<'_>) -> Result<Variable<'_>> {
    x.graph().apply(Exp, &[x])?.into_single()
}

/// Applies [`Add`] to `x0` and `x1`.
pub fn add<'g>(x0: Variable<'g>, x1: Variable<'g>) -> Result<Variable<'g>> {
    x0.graph().apply(Add, &[x0, x1])?.into_single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use approx::assert_relative_eq;
    use gradbox_core::{scalar, RawValue};
    use ndarray::arr2;

    #[test]
    fn test_square_forward() {
        let result = Square.forward(&[scalar(4.0)]).unwrap().into_vec();
        assert_eq!(result, vec![RawValue::from(scalar(16.0))]);
    }

    #[test]
    fn test_square_backward() {
        let grads = Square.backward(&[scalar(3.0)], &[scalar(2.0)]).unwrap();
        assert_eq!(grads.len(), 1);
        assert_eq!(grads[0], scalar(12.0));
    }

    #[test]
    fn test_exp_forward() {
        let a = arr2(&[[0.0, 1.0], [-1.0, 2.0]]).into_dyn();
        let result = Exp.forward(&[a.clone()]).unwrap();
        assert_eq!(result, ForwardOutput::from(a.mapv(f64::exp)));
    }

    #[test]
    fn test_exp_backward() {
        let grads = Exp.backward(&[scalar(2.0)], &[scalar(3.0)]).unwrap();
        assert_relative_eq!(grads[0].first().copied().unwrap(), 2.0_f64.exp() * 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_add_forward() {
        let a = arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn();
        let b = arr2(&[[10.0, 20.0], [30.0, 40.0]]).into_dyn();
        let result = Add.forward(&[a, b]).unwrap();
        assert_eq!(
            result,
            ForwardOutput::from(arr2(&[[11.0, 22.0], [33.0, 44.0]]).into_dyn())
        );
    }

    #[test]
    fn test_add_backward() {
        let gy = arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn();
        let grads = Add
            .backward(&[scalar(0.0), scalar(0.0)], &[gy.clone()])
            .unwrap();
        assert_eq!(grads, vec![gy.clone(), gy]);
    }

    #[test]
    fn test_helpers_build_graph() {
        let graph = Graph::new();
        let x = graph.variable(scalar(2.0)).unwrap();
        let y = graph.variable(scalar(3.0)).unwrap();

        let z = add(square(x).unwrap(), exp(y).unwrap()).unwrap();
        assert_relative_eq!(z.item().unwrap(), 4.0 + 3.0_f64.exp(), epsilon = 1e-12);
        assert_eq!(graph.num_functions(), 3);
        assert_eq!(z.generation(), 2);
    }

    #[test]
    fn test_each_call_creates_new_function() {
        let graph = Graph::new();
        let x = graph.variable(scalar(2.0)).unwrap();
        let a = square(x).unwrap();
        let b = square(x).unwrap();
        assert_ne!(a.creator(), b.creator());
    }
}
