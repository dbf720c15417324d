//! Example: gradients from several paths are summed
//!
//! Builds a = x^2, y = a^2 + a^2 at x = 2 and runs backward twice: once
//! ordered by generation, once in plain insertion order, to show why the
//! scheduler has to wait for every consumer of `a` before moving on.

use gradbox::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let graph = Graph::new();
    let x = graph.variable(scalar(2.0))?;
    let a = square(x)?;
    let y = add(square(a)?, square(a)?)?;

    y.backward()?;
    println!("y = {:?}", y.item());
    println!("x.grad (generation order) = {:?}", x.grad_item());

    graph.clear_grads();
    let config = BackwardConfig::builder()
        .order(BackwardOrder::Insertion)
        .build();
    y.backward_with(&config)?;
    println!("x.grad (insertion order) = {:?}", x.grad_item());
    Ok(())
}
