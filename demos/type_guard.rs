//! Example: what a variable can hold
//!
//! Arrays and the empty value are accepted; bare numbers must be turned
//! into arrays first.

use gradbox::prelude::*;

fn main() {
    let graph = Graph::new();

    match graph.variable(ndarray::arr0(1.0)) {
        Ok(x) => println!("array: {:?}", x.value()),
        Err(err) => println!("array rejected: {err}"),
    }

    match graph.variable(RawValue::Empty) {
        Ok(x) => println!("empty: {:?}", x.value()),
        Err(err) => println!("empty rejected: {err}"),
    }

    match graph.variable(1.0) {
        Ok(x) => println!("scalar: {:?}", x.value()),
        Err(err) => println!("scalar rejected: {err}"),
    }

    match graph.variable(as_array(RawValue::from(1.0))) {
        Ok(x) => println!("coerced scalar: {:?}", x.value()),
        Err(err) => println!("coerced scalar rejected: {err}"),
    }
}
