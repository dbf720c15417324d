//! Integration tests for graph construction and the backward scheduler.
//!
//! These tests drive the engine only through its public API: building
//! graphs with the operator helpers, running backward passes and comparing
//! the resulting gradients against closed forms and central differences.

use approx::assert_relative_eq;
use gradbox_autodiff::prelude::*;
use gradbox_core::{
    scalar, Array, BackwardConfig, BackwardOrder, GradError, NumericalDiffConfig, RawValue,
    Result, TypeKind,
};
use ndarray::{arr1, arr2};
use pretty_assertions::assert_eq;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Element-wise product, defined outside the crate.
#[derive(Debug)]
struct Mul;

impl Function for Mul {
    fn name(&self) -> &str {
        "Mul"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn forward(&self, xs: &[Array]) -> Result<ForwardOutput> {
        Ok((&xs[0] * &xs[1]).into())
    }

    fn backward(&self, xs: &[Array], gys: &[Array]) -> Result<Vec<Array>> {
        Ok(vec![&gys[0] * &xs[1], &gys[0] * &xs[0]])
    }
}

/// An operator that forgot to implement anything but its name.
#[derive(Debug)]
struct Unfinished;

impl Function for Unfinished {
    fn name(&self) -> &str {
        "Unfinished"
    }
}

fn composite(x: Variable<'_>) -> Result<Variable<'_>> {
    square(exp(square(x)?)?)
}

#[test]
fn test_chain_rule_matches_numerical_diff() {
    let graph = Graph::new();
    let x = graph.variable(scalar(0.5)).unwrap();
    let y = composite(x).unwrap();
    y.backward().unwrap();

    let num_grad = numerical_diff(composite, x, &NumericalDiffConfig::default()).unwrap();

    assert_relative_eq!(
        x.grad_item().unwrap(),
        num_grad.first().copied().unwrap(),
        max_relative = 1e-6
    );
    assert_relative_eq!(x.grad_item().unwrap(), 3.297_442_541_400_256, epsilon = 1e-12);
}

#[test]
fn test_gradient_check_random_points() {
    let mut rng = SmallRng::seed_from_u64(42);

    for _ in 0..10 {
        let graph = Graph::new();
        let value: Vec<f64> = (0..4).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let x = graph.variable(arr1(&value)).unwrap();
        let y = composite(x).unwrap();
        y.backward().unwrap();

        let num_grad = numerical_diff(composite, x, &NumericalDiffConfig::default()).unwrap();
        let grad = x.grad().unwrap();
        for (analytic, numeric) in grad.iter().zip(num_grad.iter()) {
            assert_relative_eq!(*analytic, *numeric, epsilon = 1e-5, max_relative = 1e-5);
        }
    }
}

#[test]
fn test_fan_in_sums_both_paths() {
    let graph = Graph::new();
    let x = graph.variable(scalar(2.0)).unwrap();
    let a = square(x).unwrap();
    let y = add(square(a).unwrap(), square(a).unwrap()).unwrap();

    y.backward().unwrap();

    assert_eq!(a.item(), Some(4.0));
    assert_eq!(y.item(), Some(32.0));
    assert_eq!(x.grad_item(), Some(64.0));
}

#[test]
fn test_variable_consumed_at_different_generations() {
    // a feeds Square (generation 1) and Add (generation 2).
    // y = a^2 + a with a = x^2, so dy/dx = 4x^3 + 2x.
    let graph = Graph::new();
    let x = graph.variable(scalar(2.0)).unwrap();
    let a = square(x).unwrap();
    let b = square(a).unwrap();
    let y = add(b, a).unwrap();

    let add_info = graph.function(y.creator().unwrap()).unwrap();
    let square_info = graph.function(b.creator().unwrap()).unwrap();
    assert_eq!(square_info.generation, 1);
    assert_eq!(add_info.generation, 2);

    y.backward().unwrap();

    assert_eq!(y.item(), Some(20.0));
    assert_eq!(a.grad_item(), Some(9.0));
    assert_eq!(x.grad_item(), Some(36.0));
}

#[test]
fn test_insertion_order_counter_scenario() {
    let graph = Graph::new();
    let x = graph.variable(scalar(2.0)).unwrap();
    let a = square(x).unwrap();
    let b = square(a).unwrap();
    let y = add(b, a).unwrap();

    let config = BackwardConfig::builder()
        .order(BackwardOrder::Insertion)
        .build();
    y.backward_with(&config).unwrap();

    // The creator of `a` runs before the Square fed by `a` has contributed,
    // so x receives 2x * 1 instead of 2x * (1 + 2a).
    assert_eq!(a.grad_item(), Some(9.0));
    assert_eq!(x.grad_item(), Some(4.0));

    graph.clear_grads();
    y.backward().unwrap();
    assert_eq!(x.grad_item(), Some(36.0));
}

#[test]
fn test_generation_invariants() {
    let graph = Graph::new();
    let x = graph.variable(scalar(1.5)).unwrap();
    let z = graph.variable(scalar(-0.5)).unwrap();
    let a = exp(x).unwrap();
    let b = square(add(a, z).unwrap()).unwrap();
    let y = add(b, x).unwrap();

    for id in [a.id(), b.id(), y.id()] {
        let var = graph.get(id).unwrap();
        let creator = graph.function(var.creator().unwrap()).unwrap();
        assert_eq!(var.generation(), creator.generation + 1);

        let max_input = creator
            .inputs
            .iter()
            .map(|&input| graph.get(input).unwrap().generation())
            .max()
            .unwrap();
        assert_eq!(creator.generation, max_input);
        assert!(creator.outputs.contains(&id));
    }
}

#[test]
fn test_type_guard() {
    let graph = Graph::new();

    let err = graph.variable(1.0).unwrap_err();
    assert!(matches!(
        err,
        GradError::Type(TypeKind::Unsupported { type_name: "f64" })
    ));

    let x = graph.variable(RawValue::Empty).unwrap();
    assert!(x.value().is_none());
    assert!(x.is_leaf());

    let x = graph.variable(scalar(1.0)).unwrap();
    assert_eq!(x.item(), Some(1.0));
}

#[test]
fn test_cleargrad_then_rerun_is_idempotent() {
    let graph = Graph::new();
    let x = graph.variable(scalar(2.0)).unwrap();
    let a = square(x).unwrap();
    let b = square(a).unwrap();
    let c = square(a).unwrap();
    let y = add(b, c).unwrap();

    y.backward().unwrap();
    let first = x.grad().unwrap();

    for var in [x, a, b, c, y] {
        var.cleargrad();
    }
    y.backward().unwrap();

    assert_eq!(x.grad().unwrap(), first);
}

#[test]
fn test_cleargrad_between_graphs() {
    let graph = Graph::new();
    let x = graph.variable(scalar(3.0)).unwrap();

    let y = add(x, x).unwrap();
    y.backward().unwrap();
    assert_eq!(x.grad_item(), Some(2.0));

    x.cleargrad();
    let y = add(add(x, x).unwrap(), x).unwrap();
    y.backward().unwrap();
    assert_eq!(x.grad_item(), Some(3.0));
}

#[test]
fn test_custom_operator() {
    let graph = Graph::new();
    let x = graph.variable(arr2(&[[1.0, 2.0], [3.0, 4.0]])).unwrap();
    let w = graph.variable(arr2(&[[0.5, -1.0], [2.0, 0.0]])).unwrap();
    let y = graph.apply(Mul, &[x, w]).unwrap().into_single().unwrap();

    y.backward().unwrap();

    assert_eq!(x.grad(), w.value());
    assert_eq!(w.grad(), x.value());
}

#[test]
fn test_unfinished_operator_fails() {
    let graph = Graph::new();
    let x = graph.variable(scalar(1.0)).unwrap();

    let err = graph.apply(Unfinished, &[x]).unwrap_err();
    assert!(matches!(
        err,
        GradError::NotImplemented { method: "forward", .. }
    ));
    assert_eq!(graph.num_functions(), 0);
}

#[test]
fn test_backward_on_leaf_only_seeds() {
    let graph = Graph::new();
    let x = graph.variable(arr1(&[1.0, 2.0, 3.0])).unwrap();
    let y = square(x).unwrap();

    x.backward().unwrap();

    assert_eq!(x.grad(), Some(arr1(&[1.0, 1.0, 1.0]).into_dyn()));
    assert!(y.grad().is_none());
}
