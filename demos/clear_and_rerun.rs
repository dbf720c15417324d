//! Example: reusing a variable across backward passes
//!
//! Gradients accumulate until they are cleared, so `cleargrad` has to be
//! called before differentiating a new expression of the same input.

use gradbox::prelude::*;

fn main() -> Result<()> {
    let graph = Graph::new();
    let x = graph.variable(scalar(3.0))?;

    let y = add(x, x)?;
    y.backward()?;
    println!("d(x + x)/dx = {:?}", x.grad_item());

    x.cleargrad();
    let y = add(add(x, x)?, x)?;
    y.backward()?;
    println!("d(x + x + x)/dx = {:?}", x.grad_item());
    Ok(())
}
