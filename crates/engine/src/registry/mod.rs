//! Pluggable handler registries.
//!
//! The kernel is a generic dispatcher: actions, conditions, and event
//! matchers are looked up by name at evaluation time. Hosts may register
//! their own handlers next to the built-in vocabulary; an unknown name
//! reaching the kernel is a fatal configuration error.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use tripwright_domain::{ActionContext, EvalContext, Event, EventSpec, IfStatement, ResultOp};

use crate::error::KernelError;
use crate::eval::evaluator::register_combinators;
use crate::modules;

/// Handler parameters: the action's or condition's own keys, minus the
/// structural ones (`name` / `op`).
pub type Params = Map<String, Value>;

/// Recurse-only capability handed to condition handlers so composites
/// (`and`/`or`/`not`) can evaluate nested statements without holding the
/// whole evaluator.
pub type RecurseFn<'a> = dyn Fn(&EvalContext, Option<&IfStatement>) -> Result<bool, KernelError> + 'a;

/// A registered action implementation.
pub trait ActionHandler: Send + Sync {
    /// Compute the ops this action produces. Soft failures are `log`
    /// ops, not errors.
    fn get_ops(&self, params: &Params, ctx: &ActionContext) -> Result<Vec<ResultOp>, KernelError>;
}

/// A registered condition implementation.
pub trait ConditionHandler: Send + Sync {
    fn eval(
        &self,
        params: &Params,
        eval_context: &EvalContext,
        recurse: &RecurseFn<'_>,
    ) -> Result<bool, KernelError>;
}

/// A registered event type's trigger-spec matcher.
pub trait EventHandler: Send + Sync {
    fn match_event(&self, spec: &EventSpec, event: &Event, ctx: &ActionContext) -> bool;
}

/// String-keyed registries for the three handler categories.
pub struct Registry {
    actions: HashMap<String, Arc<dyn ActionHandler>>,
    conditions: HashMap<String, Arc<dyn ConditionHandler>>,
    events: HashMap<String, Arc<dyn EventHandler>>,
}

impl Registry {
    /// An empty registry carrying only the `and`/`or`/`not` combinators.
    pub fn new() -> Self {
        let mut registry = Self {
            actions: HashMap::new(),
            conditions: HashMap::new(),
            events: HashMap::new(),
        };
        register_combinators(&mut registry);
        registry
    }

    /// A registry wired with the stock module vocabulary.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        modules::register_builtins(&mut registry);
        registry
    }

    pub fn register_action(&mut self, name: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        self.actions.insert(name.into(), handler);
    }

    pub fn register_condition(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn ConditionHandler>,
    ) {
        self.conditions.insert(name.into(), handler);
    }

    pub fn register_event(&mut self, name: impl Into<String>, handler: Arc<dyn EventHandler>) {
        self.events.insert(name.into(), handler);
    }

    pub fn action(&self, name: &str) -> Option<&Arc<dyn ActionHandler>> {
        self.actions.get(name)
    }

    pub fn condition(&self, name: &str) -> Option<&Arc<dyn ConditionHandler>> {
        self.conditions.get(name)
    }

    pub fn event(&self, name: &str) -> Option<&Arc<dyn EventHandler>> {
        self.events.get(name)
    }

    /// Sorted condition op names, for configuration-error messages.
    pub fn condition_ops(&self) -> Vec<String> {
        let mut ops: Vec<String> = self.conditions.keys().cloned().collect();
        ops.sort();
        ops
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
