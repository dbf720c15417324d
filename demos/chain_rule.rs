//! Example: chain rule through a composite function
//!
//! Computes y = (exp(x^2))^2 at x = 0.5, differentiates it with a backward
//! pass and compares the result with a central-difference estimate.
//!
//! Set `RUST_LOG=gradbox_autodiff=trace` to see the scheduler at work.

use gradbox::prelude::*;
use tracing_subscriber::EnvFilter;

fn composite(x: Variable<'_>) -> Result<Variable<'_>> {
    square(exp(square(x)?)?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let graph = Graph::new();
    let x = graph.variable(scalar(0.5))?;
    let y = composite(x)?;
    y.backward()?;

    let num_grad = numerical_diff(composite, x, &NumericalDiffConfig::default())?;

    println!("y = {:?}", y.value());
    println!("x.grad = {:?}", x.grad());
    println!("numerical = {num_grad}");
    Ok(())
}
