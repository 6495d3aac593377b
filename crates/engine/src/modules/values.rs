//! Trip values: set/increment actions and the `value_*` conditions.

use std::sync::Arc;

use serde_json::{Map, Number, Value};

use tripwright_domain::{ActionContext, EvalContext, ResultOp};

use crate::error::KernelError;
use crate::eval::{is_truthy, lookup_ref, to_comparable_string, to_number};
use crate::registry::{ActionHandler, ConditionHandler, Params, RecurseFn, Registry};

pub fn register(registry: &mut Registry) {
    registry.register_action("set_value", Arc::new(SetValue));
    registry.register_action("increment_value", Arc::new(IncrementValue));
    registry.register_condition("value_is_true", Arc::new(ValueIsTrue));
    registry.register_condition("value_equals", Arc::new(ValueEquals));
    registry.register_condition("value_contains", Arc::new(ValueContains));
    registry.register_condition("value_compare", Arc::new(ValueCompare));
}

fn values_op(key: &str, value: Value) -> ResultOp {
    let mut values = Map::new();
    values.insert(key.to_string(), value);
    ResultOp::UpdateTripValues { values }
}

fn number_from_f64(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9e15 {
        Value::Number(Number::from(value as i64))
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Set a trip value to the result of looking up a ref.
struct SetValue;

impl ActionHandler for SetValue {
    fn get_ops(&self, params: &Params, ctx: &ActionContext) -> Result<Vec<ResultOp>, KernelError> {
        let Some(value_ref) = params.get("value_ref").and_then(Value::as_str) else {
            return Ok(vec![ResultOp::log_error(
                "set_value requires a \"value_ref\" param.",
            )]);
        };
        let new_value = lookup_ref(
            &ctx.eval_context,
            params.get("new_value_ref").unwrap_or(&Value::Null),
        );
        Ok(vec![values_op(value_ref, new_value)])
    }
}

/// Add a delta to a numeric trip value; absent values count from zero.
struct IncrementValue;

impl ActionHandler for IncrementValue {
    fn get_ops(&self, params: &Params, ctx: &ActionContext) -> Result<Vec<ResultOp>, KernelError> {
        let Some(value_ref) = params.get("value_ref").and_then(Value::as_str) else {
            return Ok(vec![ResultOp::log_error(
                "increment_value requires a \"value_ref\" param.",
            )]);
        };
        let current = to_number(&lookup_ref(
            &ctx.eval_context,
            &Value::String(value_ref.to_string()),
        ));
        let delta = params.get("delta").map(to_number).unwrap_or(1.0);
        Ok(vec![values_op(value_ref, number_from_f64(current + delta))])
    }
}

fn looked_up(params: &Params, key: &str, eval_context: &EvalContext) -> Value {
    lookup_ref(eval_context, params.get(key).unwrap_or(&Value::Null))
}

/// Passes if the ref resolves to any non-false value.
struct ValueIsTrue;

impl ConditionHandler for ValueIsTrue {
    fn eval(
        &self,
        params: &Params,
        eval_context: &EvalContext,
        _recurse: &RecurseFn<'_>,
    ) -> Result<bool, KernelError> {
        Ok(is_truthy(&looked_up(params, "ref", eval_context)))
    }
}

/// Passes if both refs resolve to equal values, compared as
/// case-insensitive strings. Two absent values are equal.
struct ValueEquals;

impl ConditionHandler for ValueEquals {
    fn eval(
        &self,
        params: &Params,
        eval_context: &EvalContext,
        _recurse: &RecurseFn<'_>,
    ) -> Result<bool, KernelError> {
        let val1 = looked_up(params, "ref1", eval_context);
        let val2 = looked_up(params, "ref2", eval_context);
        if !is_truthy(&val1) && !is_truthy(&val2) {
            return Ok(true);
        }
        Ok(to_comparable_string(&val1) == to_comparable_string(&val2))
    }
}

/// Passes if the search value contains the part value, ignoring case.
/// Both must resolve to strings.
struct ValueContains;

impl ConditionHandler for ValueContains {
    fn eval(
        &self,
        params: &Params,
        eval_context: &EvalContext,
        _recurse: &RecurseFn<'_>,
    ) -> Result<bool, KernelError> {
        let haystack = looked_up(params, "string_ref", eval_context);
        let needle = looked_up(params, "part_ref", eval_context);
        match (haystack.as_str(), needle.as_str()) {
            (Some(haystack), Some(needle)) => {
                Ok(haystack.to_lowercase().contains(&needle.to_lowercase()))
            }
            _ => Ok(false),
        }
    }
}

/// Numeric comparison; non-numeric values compare as zero.
struct ValueCompare;

impl ConditionHandler for ValueCompare {
    fn eval(
        &self,
        params: &Params,
        eval_context: &EvalContext,
        _recurse: &RecurseFn<'_>,
    ) -> Result<bool, KernelError> {
        let num1 = to_number(&looked_up(params, "ref1", eval_context));
        let num2 = to_number(&looked_up(params, "ref2", eval_context));
        let comparator = params
            .get("comparator")
            .and_then(Value::as_str)
            .unwrap_or(">=");
        match comparator {
            "<" => Ok(num1 < num2),
            "<=" => Ok(num1 <= num2),
            "==" => Ok(num1 == num2),
            ">=" => Ok(num1 >= num2),
            ">" => Ok(num1 > num2),
            other => Err(KernelError::MalformedCondition(format!(
                "unknown comparator \"{other}\""
            ))),
        }
    }
}
