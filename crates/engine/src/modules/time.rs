//! Time: the `wait` family of actions and the `time_occurred` event.
//!
//! Wait actions emit the internal `wait` op kind. The kernel's trigger
//! loop consumes those signals to defer subsequent actions; they are
//! never persisted or scheduled themselves.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use tripwright_domain::{
    seconds_for_duration_shorthand, seconds_for_offset_shorthand, ActionContext, EvalContext,
    Event, EventSpec, ResultOp,
};

use crate::error::KernelError;
use crate::registry::{ActionHandler, EventHandler, Params, Registry};

pub fn register(registry: &mut Registry) {
    registry.register_action("wait", Arc::new(Wait));
    registry.register_action("wait_for_time", Arc::new(WaitForTime));
    registry.register_action("wait_before_time", Arc::new(WaitBeforeTime));
    registry.register_event("time_occurred", Arc::new(TimeOccurred));
}

/// The moment a `time_occurred` trigger spec refers to: the named
/// schedule entry plus the spec's offset. Exposed for host schedulers
/// planning when to enqueue time events.
pub fn time_for_spec(spec: &EventSpec, eval_context: &EvalContext) -> Option<DateTime<Utc>> {
    let time_name = spec.get_str("time")?;
    let scheduled = eval_context.schedule_time(time_name)?;
    let offset = spec
        .get_str("offset")
        .map(seconds_for_offset_shorthand)
        .unwrap_or(0);
    Some(scheduled + Duration::seconds(offset))
}

/// Wait a relative duration (`"10s"`, `"3m"`).
struct Wait;

impl ActionHandler for Wait {
    fn get_ops(&self, params: &Params, _ctx: &ActionContext) -> Result<Vec<ResultOp>, KernelError> {
        let duration = params.get("duration").and_then(Value::as_str).unwrap_or("");
        Ok(vec![ResultOp::Wait {
            seconds: Some(seconds_for_duration_shorthand(duration)),
            until: None,
        }])
    }
}

/// Wait until a named schedule time.
struct WaitForTime;

impl ActionHandler for WaitForTime {
    fn get_ops(&self, params: &Params, ctx: &ActionContext) -> Result<Vec<ResultOp>, KernelError> {
        let time_name = params.get("until").and_then(Value::as_str).unwrap_or("");
        let Some(until) = ctx.eval_context.schedule_time(time_name) else {
            return Ok(vec![ResultOp::log_error(format!(
                "Could not find time named \"{time_name}\"."
            ))]);
        };
        Ok(vec![ResultOp::Wait {
            seconds: None,
            until: Some(until),
        }])
    }
}

/// Wait until shortly before a named schedule time.
struct WaitBeforeTime;

impl ActionHandler for WaitBeforeTime {
    fn get_ops(&self, params: &Params, ctx: &ActionContext) -> Result<Vec<ResultOp>, KernelError> {
        let time_name = params.get("until").and_then(Value::as_str).unwrap_or("");
        let Some(until) = ctx.eval_context.schedule_time(time_name) else {
            return Ok(vec![ResultOp::log_error(format!(
                "Could not find time named \"{time_name}\"."
            ))]);
        };
        let before = params.get("before").and_then(Value::as_str).unwrap_or("");
        let seconds = seconds_for_duration_shorthand(before);
        Ok(vec![ResultOp::Wait {
            seconds: None,
            until: Some(until - Duration::seconds(seconds)),
        }])
    }
}

/// Matches once the spec's moment (schedule entry + offset) has come to
/// pass relative to the event's timestamp (unix seconds).
struct TimeOccurred;

impl EventHandler for TimeOccurred {
    fn match_event(&self, spec: &EventSpec, event: &Event, ctx: &ActionContext) -> bool {
        let Some(intended_at) = time_for_spec(spec, &ctx.eval_context) else {
            return false;
        };
        let Some(event_timestamp) = event.get("timestamp").and_then(Value::as_i64) else {
            return false;
        };
        intended_at.timestamp() <= event_timestamp
    }
}
