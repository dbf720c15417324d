//! Define-by-run computation graph.
//!
//! The graph is an arena: variables and functions are stored in two vectors
//! and refer to each other through [`VariableId`] and [`FunctionId`]
//! handles. A variable points to the function that created it, and a
//! function lists its input and output variables, without either side owning
//! the other. Everything is freed when the [`Graph`] is dropped.
//!
//! Nodes are only ever appended. Values are fixed at creation, while
//! gradients are filled in by backward passes and reset with
//! [`Variable::cleargrad`] or [`Graph::clear_grads`].

use crate::backward;
use crate::function::Function;
use gradbox_core::{as_array, ones_like, zeros_like, Array, BackwardConfig, GradError, RawValue, Result};
use std::cell::RefCell;
use std::fmt;
use tracing::{debug, instrument};

/// Unique identifier for variables in a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(usize);

impl VariableId {
    /// Position of the variable in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Var{}", self.0)
    }
}

/// Unique identifier for functions in a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(usize);

impl FunctionId {
    /// Position of the function in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Func{}", self.0)
    }
}

/// Storage for one variable.
#[derive(Debug)]
pub(crate) struct VariableNode {
    pub(crate) value: Option<Array>,
    pub(crate) grad: Option<Array>,
    pub(crate) creator: Option<FunctionId>,
    pub(crate) generation: usize,
    pub(crate) name: Option<String>,
}

impl VariableNode {
    fn leaf(value: Option<Array>) -> Self {
        Self {
            value,
            grad: None,
            creator: None,
            generation: 0,
            name: None,
        }
    }
}

/// Storage for one function call.
#[derive(Debug)]
pub(crate) struct FunctionNode {
    pub(crate) function: Box<dyn Function>,
    pub(crate) inputs: Vec<VariableId>,
    pub(crate) outputs: Vec<VariableId>,
    pub(crate) generation: usize,
}

/// Read-only view of a recorded function call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    /// Handle of the function
    pub id: FunctionId,
    /// Name reported by the function
    pub name: String,
    /// Maximum generation among the inputs
    pub generation: usize,
    /// Input variables, in call order
    pub inputs: Vec<VariableId>,
    /// Output variables, in result order
    pub outputs: Vec<VariableId>,
}

/// The computation graph structure.
///
/// Uses interior mutability so that variables can hold a shared reference
/// to the graph; it is therefore neither `Sync` nor meant to be shared
/// across threads.
#[derive(Debug, Default)]
pub struct Graph {
    variables: RefCell<Vec<VariableNode>>,
    functions: RefCell<Vec<FunctionNode>>,
}

impl Graph {
    /// Creates a new empty computation graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a leaf variable.
    ///
    /// `value` must be an array or empty. Bare scalars and sequences fail
    /// with [`TypeKind::Unsupported`](gradbox_core::TypeKind); use
    /// [`as_array`] or [`scalar`](gradbox_core::scalar) to convert them first.
    pub fn variable(&self, value: impl Into<RawValue>) -> Result<Variable<'_>> {
        let value = value.into().into_array()?;
        Ok(self.push_variable(VariableNode::leaf(value)))
    }

    /// Creates a named leaf variable.
    pub fn named_variable(
        &self,
        value: impl Into<RawValue>,
        name: impl Into<String>,
    ) -> Result<Variable<'_>> {
        let var = self.variable(value)?;
        self.variables.borrow_mut()[var.id.0].name = Some(name.into());
        Ok(var)
    }

    /// Applies a function to input variables, recording the call.
    ///
    /// Runs `forward` on the input values, wraps each result into a new
    /// variable, and links the outputs to the function. Nothing is recorded
    /// if any step fails.
    #[instrument(level = "debug", skip_all, fields(function = function.name(), inputs = inputs.len()))]
    pub fn apply<'g, F>(&'g self, function: F, inputs: &[Variable<'g>]) -> Result<Output<'g>>
    where
        F: Function + 'static,
    {
        for input in inputs {
            self.check_owned(*input)?;
        }
        if let Some(arity) = function.arity() {
            if arity != inputs.len() {
                return Err(GradError::arity_mismatch(function.name(), arity, inputs.len()));
            }
        }

        let (xs, generation) = {
            let variables = self.variables.borrow();
            let mut xs = Vec::with_capacity(inputs.len());
            let mut generation = 0;
            for input in inputs {
                let node = &variables[input.id.0];
                let value = node
                    .value
                    .clone()
                    .ok_or_else(|| GradError::empty_value(input.id))?;
                xs.push(value);
                generation = generation.max(node.generation);
            }
            (xs, generation)
        };

        let ys = function
            .forward(&xs)?
            .into_vec()
            .into_iter()
            .map(|y| as_array(y).into_array())
            .collect::<Result<Vec<_>>>()?;

        let function_id = FunctionId(self.functions.borrow().len());
        let outputs: Vec<VariableId> = ys
            .into_iter()
            .map(|y| self.push_variable(VariableNode::leaf(y)).id)
            .collect();
        debug!(
            function = %function_id,
            name = function.name(),
            generation,
            outputs = outputs.len(),
            "recorded function"
        );

        self.functions.borrow_mut().push(FunctionNode {
            function: Box::new(function),
            inputs: inputs.iter().map(|input| input.id).collect(),
            outputs: outputs.clone(),
            generation,
        });
        for &output in &outputs {
            self.set_creator(output, function_id);
        }

        let mut outputs: Vec<Variable<'g>> = outputs.into_iter().map(|id| self.handle(id)).collect();
        if outputs.len() == 1 {
            Ok(Output::Single(outputs.remove(0)))
        } else {
            Ok(Output::Multiple(outputs))
        }
    }

    /// Returns a read-only view of a recorded function.
    pub fn function(&self, id: FunctionId) -> Option<FunctionInfo> {
        self.functions.borrow().get(id.0).map(|node| FunctionInfo {
            id,
            name: node.function.name().to_string(),
            generation: node.generation,
            inputs: node.inputs.clone(),
            outputs: node.outputs.clone(),
        })
    }

    /// Returns a handle for a variable of this graph.
    pub fn get(&self, id: VariableId) -> Option<Variable<'_>> {
        (id.0 < self.num_variables()).then(|| self.handle(id))
    }

    /// Returns the number of variables in the graph.
    pub fn num_variables(&self) -> usize {
        self.variables.borrow().len()
    }

    /// Returns the number of recorded functions.
    pub fn num_functions(&self) -> usize {
        self.functions.borrow().len()
    }

    /// Resets the gradient of every variable in the graph.
    pub fn clear_grads(&self) {
        for node in self.variables.borrow_mut().iter_mut() {
            node.grad = None;
        }
    }

    fn handle(&self, id: VariableId) -> Variable<'_> {
        Variable { graph: self, id }
    }

    fn push_variable(&self, node: VariableNode) -> Variable<'_> {
        let mut variables = self.variables.borrow_mut();
        let id = VariableId(variables.len());
        variables.push(node);
        Variable { graph: self, id }
    }

    /// Records `function` as the creator of `variable`.
    fn set_creator(&self, variable: VariableId, function: FunctionId) {
        let generation = self.functions.borrow()[function.0].generation;
        let mut variables = self.variables.borrow_mut();
        let node = &mut variables[variable.0];
        debug_assert!(node.creator.is_none(), "{variable} already has a creator");
        node.creator = Some(function);
        node.generation = generation + 1;
    }

    fn check_owned(&self, variable: Variable<'_>) -> Result<()> {
        if std::ptr::eq(variable.graph, self) {
            Ok(())
        } else {
            Err(GradError::foreign_variable(variable.id))
        }
    }

    pub(crate) fn variable_node<R>(&self, id: VariableId, f: impl FnOnce(&VariableNode) -> R) -> R {
        f(&self.variables.borrow()[id.0])
    }

    pub(crate) fn variable_node_mut<R>(
        &self,
        id: VariableId,
        f: impl FnOnce(&mut VariableNode) -> R,
    ) -> R {
        f(&mut self.variables.borrow_mut()[id.0])
    }

    pub(crate) fn function_node<R>(&self, id: FunctionId, f: impl FnOnce(&FunctionNode) -> R) -> R {
        f(&self.functions.borrow()[id.0])
    }

    /// Seeds the gradient of `id` with ones if it has none.
    pub(crate) fn seed_grad(&self, id: VariableId) -> Result<()> {
        self.variable_node_mut(id, |node| {
            if node.grad.is_none() {
                let value = node.value.as_ref().ok_or_else(|| GradError::empty_value(id))?;
                node.grad = Some(ones_like(value));
            }
            Ok(())
        })
    }

    /// Returns the values of `ids`, which must all be set.
    pub(crate) fn values(&self, ids: &[VariableId]) -> Result<Vec<Array>> {
        let variables = self.variables.borrow();
        ids.iter()
            .map(|&id| {
                variables[id.0]
                    .value
                    .clone()
                    .ok_or_else(|| GradError::empty_value(id))
            })
            .collect()
    }

    /// Returns the gradients of `ids`, substituting zeros where a variable
    /// received no gradient in the current pass.
    pub(crate) fn grads_or_zeros(&self, ids: &[VariableId]) -> Result<Vec<Array>> {
        let variables = self.variables.borrow();
        ids.iter()
            .map(|&id| {
                let node = &variables[id.0];
                match (&node.grad, &node.value) {
                    (Some(grad), _) => Ok(grad.clone()),
                    (None, Some(value)) => Ok(zeros_like(value)),
                    (None, None) => Err(GradError::empty_value(id)),
                }
            })
            .collect()
    }
}

/// Handle to a variable in a [`Graph`].
///
/// Cheap to copy; all data lives in the graph.
#[derive(Clone, Copy)]
pub struct Variable<'g> {
    graph: &'g Graph,
    id: VariableId,
}

impl<'g> Variable<'g> {
    /// Returns the handle of this variable.
    pub fn id(&self) -> VariableId {
        self.id
    }

    /// Returns the graph this variable lives in.
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// Returns a copy of the value, or `None` for an empty variable.
    pub fn value(&self) -> Option<Array> {
        self.graph.variable_node(self.id, |node| node.value.clone())
    }

    /// Returns a copy of the accumulated gradient.
    pub fn grad(&self) -> Option<Array> {
        self.graph.variable_node(self.id, |node| node.grad.clone())
    }

    /// Overwrites the gradient, e.g. to start a backward pass from a custom
    /// upstream gradient.
    pub fn set_grad(&self, grad: Option<Array>) {
        self.graph.variable_node_mut(self.id, |node| node.grad = grad);
    }

    /// Resets the gradient to `None`.
    pub fn cleargrad(&self) {
        self.set_grad(None);
    }

    /// Returns the function that produced this variable, if any.
    pub fn creator(&self) -> Option<FunctionId> {
        self.graph.variable_node(self.id, |node| node.creator)
    }

    /// Returns the depth of this variable in the graph; 0 for leaves.
    pub fn generation(&self) -> usize {
        self.graph.variable_node(self.id, |node| node.generation)
    }

    /// Returns true if the variable was supplied directly rather than
    /// produced by a function.
    pub fn is_leaf(&self) -> bool {
        self.creator().is_none()
    }

    /// Returns the name given at creation.
    pub fn name(&self) -> Option<String> {
        self.graph.variable_node(self.id, |node| node.name.clone())
    }

    /// Returns the shape of the value.
    pub fn shape(&self) -> Option<Vec<usize>> {
        self.graph
            .variable_node(self.id, |node| node.value.as_ref().map(|v| v.shape().to_vec()))
    }

    /// Returns the number of dimensions of the value.
    pub fn ndim(&self) -> Option<usize> {
        self.graph
            .variable_node(self.id, |node| node.value.as_ref().map(Array::ndim))
    }

    /// Returns the number of elements of the value.
    pub fn len(&self) -> Option<usize> {
        self.graph
            .variable_node(self.id, |node| node.value.as_ref().map(Array::len))
    }

    /// Returns true if the variable holds no value.
    pub fn is_empty(&self) -> bool {
        self.graph.variable_node(self.id, |node| node.value.is_none())
    }

    /// Returns the value as a number if it holds exactly one element.
    pub fn item(&self) -> Option<f64> {
        self.graph.variable_node(self.id, |node| single(node.value.as_ref()))
    }

    /// Returns the gradient as a number if it holds exactly one element.
    pub fn grad_item(&self) -> Option<f64> {
        self.graph.variable_node(self.id, |node| single(node.grad.as_ref()))
    }

    /// Computes the gradient of this variable with respect to every
    /// variable it depends on.
    ///
    /// Seeds this variable's gradient with ones if it has none, then
    /// accumulates into the gradient of every variable reachable through
    /// creator links.
    pub fn backward(&self) -> Result<()> {
        self.backward_with(&BackwardConfig::default())
    }

    /// Same as [`Variable::backward`] with an explicit configuration.
    pub fn backward_with(&self, config: &BackwardConfig) -> Result<()> {
        backward::backward(self.graph, self.id, config)
    }
}

fn single(array: Option<&Array>) -> Option<f64> {
    array.filter(|a| a.len() == 1).and_then(|a| a.first().copied())
}

impl fmt::Debug for Variable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("generation", &self.generation())
            .finish()
    }
}

impl PartialEq for Variable<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.id == other.id
    }
}

impl Eq for Variable<'_> {}

/// Variables returned by [`Graph::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output<'g> {
    /// The function produced exactly one output.
    Single(Variable<'g>),
    /// The function produced zero or several outputs.
    Multiple(Vec<Variable<'g>>),
}

impl<'g> Output<'g> {
    /// Returns the only output, failing if there is not exactly one.
    pub fn into_single(self) -> Result<Variable<'g>> {
        match self {
            Self::Single(var) => Ok(var),
            Self::Multiple(vars) => Err(GradError::arity_mismatch("output", 1, vars.len())),
        }
    }

    /// Returns all outputs in order.
    pub fn into_vec(self) -> Vec<Variable<'g>> {
        match self {
            Self::Single(var) => vec![var],
            Self::Multiple(vars) => vars,
        }
    }

    /// Returns the number of outputs.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multiple(vars) => vars.len(),
        }
    }

    /// Returns true if the function produced no outputs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
