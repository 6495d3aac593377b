//! The condition evaluator.
//!
//! Pure dispatch over the condition registry, plus the boolean
//! combinators. An absent condition evaluates to true (absence of a
//! guard means unconditional pass); an unknown op is a fatal
//! configuration error naming the valid ops.

use serde_json::Value;

use tripwright_domain::{EvalContext, IfStatement};

use crate::error::KernelError;
use crate::registry::{ConditionHandler, Params, RecurseFn, Registry};

/// Evaluates condition trees against an eval context.
pub struct Evaluator<'r> {
    registry: &'r Registry,
}

impl<'r> Evaluator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Evaluate a condition node. No statement means true.
    pub fn evaluate(
        &self,
        eval_context: &EvalContext,
        statement: Option<&IfStatement>,
    ) -> Result<bool, KernelError> {
        let Some(statement) = statement else {
            return Ok(true);
        };
        let handler = self.registry.condition(&statement.op).ok_or_else(|| {
            KernelError::invalid_condition_op(&statement.op, self.registry.condition_ops())
        })?;
        let recurse =
            |ctx: &EvalContext, nested: Option<&IfStatement>| self.evaluate(ctx, nested);
        handler.eval(&statement.params, eval_context, &recurse)
    }
}

/// Install `and`/`or`/`not` into a registry. Called by `Registry::new`,
/// so the combinators exist even in an otherwise-empty registry.
pub(crate) fn register_combinators(registry: &mut Registry) {
    registry.register_condition("and", std::sync::Arc::new(AndCondition));
    registry.register_condition("or", std::sync::Arc::new(OrCondition));
    registry.register_condition("not", std::sync::Arc::new(NotCondition));
}

fn parse_statement(value: &Value) -> Result<IfStatement, KernelError> {
    serde_json::from_value(value.clone())
        .map_err(|err| KernelError::MalformedCondition(err.to_string()))
}

fn nested_items(params: &Params) -> Result<Vec<IfStatement>, KernelError> {
    let Some(items) = params.get("items") else {
        return Ok(Vec::new());
    };
    let items = items.as_array().ok_or_else(|| {
        KernelError::MalformedCondition("expected \"items\" to be a list".to_string())
    })?;
    items.iter().map(parse_statement).collect()
}

/// True iff every item is true; an empty list is true.
struct AndCondition;

impl ConditionHandler for AndCondition {
    fn eval(
        &self,
        params: &Params,
        eval_context: &EvalContext,
        recurse: &RecurseFn<'_>,
    ) -> Result<bool, KernelError> {
        for item in nested_items(params)? {
            if !recurse(eval_context, Some(&item))? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// True iff at least one item is true; an empty list is false.
struct OrCondition;

impl ConditionHandler for OrCondition {
    fn eval(
        &self,
        params: &Params,
        eval_context: &EvalContext,
        recurse: &RecurseFn<'_>,
    ) -> Result<bool, KernelError> {
        for item in nested_items(params)? {
            if recurse(eval_context, Some(&item))? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// True iff the wrapped item is false. `not` of nothing is false.
struct NotCondition;

impl ConditionHandler for NotCondition {
    fn eval(
        &self,
        params: &Params,
        eval_context: &EvalContext,
        recurse: &RecurseFn<'_>,
    ) -> Result<bool, KernelError> {
        let item = match params.get("item") {
            None | Some(Value::Null) => return Ok(false),
            Some(item) => parse_statement(item)?,
        };
        Ok(!recurse(eval_context, Some(&item))?)
    }
}
