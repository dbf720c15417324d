//! Backward pass implementation for automatic differentiation.
//!
//! Starting from a target variable, the scheduler walks creator links
//! towards the leaves. Pending functions sit in a worklist; with the default
//! [`BackwardOrder::Generation`] the function with the highest generation is
//! always processed next. Since a function's generation is the maximum of
//! its inputs' and every output sits one generation above its creator, no
//! function still waiting in the worklist can feed a gradient into the
//! outputs of the one being processed.
//!
//! Each function runs at most once per pass. Gradients reaching a variable
//! along several paths are summed.

use crate::graph::{FunctionId, Graph, VariableId};
use gradbox_core::{Array, BackwardConfig, BackwardOrder, GradError, Result};
use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, instrument, trace};

/// Function waiting in the worklist, ordered by generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Pending {
    generation: usize,
    id: FunctionId,
}

/// Pending functions of a backward pass.
#[derive(Debug)]
enum Worklist {
    Generation(BinaryHeap<Pending>),
    Insertion(Vec<FunctionId>),
}

impl Worklist {
    fn new(order: BackwardOrder) -> Self {
        match order {
            BackwardOrder::Generation => Self::Generation(BinaryHeap::new()),
            BackwardOrder::Insertion => Self::Insertion(Vec::new()),
        }
    }

    fn push(&mut self, id: FunctionId, generation: usize) {
        match self {
            Self::Generation(heap) => heap.push(Pending { generation, id }),
            Self::Insertion(stack) => stack.push(id),
        }
    }

    fn pop(&mut self) -> Option<FunctionId> {
        match self {
            Self::Generation(heap) => heap.pop().map(|pending| pending.id),
            Self::Insertion(stack) => stack.pop(),
        }
    }
}

/// Performs backward pass (backpropagation) from `target`.
///
/// If `target` has no gradient it is seeded with ones of the same shape.
/// Gradients are accumulated into every variable reachable from `target`
/// through creator links; existing gradients are added to, not replaced.
/// Calling this on a leaf only seeds its gradient. A `target` that is not a
/// variable of `graph` fails with [`GradError::ForeignVariable`].
#[instrument(level = "debug", skip(graph, config), fields(order = ?config.order))]
pub fn backward(graph: &Graph, target: VariableId, config: &BackwardConfig) -> Result<()> {
    if target.index() >= graph.num_variables() {
        return Err(GradError::foreign_variable(target));
    }
    graph.seed_grad(target)?;

    let mut worklist = Worklist::new(config.order);
    let mut seen = HashSet::new();
    let mut enqueue = |worklist: &mut Worklist, id: FunctionId| {
        if seen.insert(id) {
            let generation = graph.function_node(id, |node| node.generation);
            worklist.push(id, generation);
        }
    };

    if let Some(creator) = graph.variable_node(target, |node| node.creator) {
        enqueue(&mut worklist, creator);
    }

    let mut processed = 0_usize;
    while let Some(id) = worklist.pop() {
        let (inputs, gxs) = graph.function_node(id, |node| -> Result<_> {
            let xs = graph.values(&node.inputs)?;
            let gys = graph.grads_or_zeros(&node.outputs)?;
            trace!(
                function = %id,
                name = node.function.name(),
                generation = node.generation,
                "running backward"
            );
            let gxs = node.function.backward(&xs, &gys)?;
            if gxs.len() != node.inputs.len() {
                return Err(GradError::arity_mismatch(
                    node.function.name(),
                    node.inputs.len(),
                    gxs.len(),
                ));
            }
            Ok((node.inputs.clone(), gxs))
        })?;

        for (input, gx) in inputs.into_iter().zip(gxs) {
            accumulate(graph, input, gx)?;
            if let Some(creator) = graph.variable_node(input, |node| node.creator) {
                enqueue(&mut worklist, creator);
            }
        }
        processed += 1;
    }

    debug!(processed, "backward pass finished");
    Ok(())
}

/// Adds `gx` to the gradient of `id`, or stores it if there is none.
///
/// A first gradient must have the shape of the variable's value.
fn accumulate(graph: &Graph, id: VariableId, gx: Array) -> Result<()> {
    graph.variable_node_mut(id, |node| match node.grad.as_mut() {
        None => {
            if let Some(value) = &node.value {
                if value.shape() != gx.shape() {
                    return Err(GradError::shape_mismatch(value.shape(), gx.shape()));
                }
            }
            node.grad = Some(gx);
            Ok(())
        }
        Some(grad) if grad.shape() == gx.shape() => {
            trace!(variable = %id, "accumulating gradient");
            *grad += &gx;
            Ok(())
        }
        Some(grad) => Err(GradError::shape_mismatch(grad.shape(), gx.shape())),
    })
}
