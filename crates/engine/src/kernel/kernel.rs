//! The recursive evaluation kernel.
//!
//! One kernel call computes the full synchronous cascade of an action
//! or event: the ops it produces, the events those ops synthesize, the
//! triggers those events fire, and the sub-actions those triggers run -
//! splitting "apply now" from "apply later" along the way. The kernel
//! is single-threaded and pure: no I/O, no timers, no mutation of its
//! inputs. The caller persists `result_ops` and re-invokes the kernel
//! for each `scheduled_action` once due.

use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};

use tripwright_domain::{
    ActionContext, Event, KernelAction, ResultOp, ScheduledAction, Trigger,
};

use crate::error::KernelError;
use crate::eval::Evaluator;
use crate::registry::Registry;

use super::actions::actions_for_trigger;
use super::result::{concat_result, initial_result, result_for_ops, KernelResult};
use super::triggers::triggers_for_event;

/// The evaluation kernel. Holds the handler registry; everything else
/// flows through arguments.
pub struct Kernel {
    registry: Arc<Registry>,
}

impl Kernel {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// A kernel over the stock built-in vocabulary.
    pub fn with_builtins() -> Self {
        Self::new(Arc::new(Registry::with_builtins()))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Apply one action and everything it cascades into.
    pub fn apply_action(
        &self,
        action: &KernelAction,
        ctx: &ActionContext,
    ) -> Result<KernelResult, KernelError> {
        tracing::debug!(action = %action.name, "applying action");
        self.result_for_immediate_action(action, ctx, &[])
    }

    /// Apply one external event and everything it cascades into.
    pub fn apply_event(
        &self,
        event: &Event,
        ctx: &ActionContext,
    ) -> Result<KernelResult, KernelError> {
        tracing::debug!(event_type = event.event_type().unwrap_or(""), "applying event");
        self.result_for_event(event, ctx, &[])
    }

    /// Apply one named trigger directly (used by host schedulers that
    /// persist trigger firings). None when the script has no such
    /// trigger.
    pub fn apply_trigger(
        &self,
        trigger_name: &str,
        event: &Event,
        ctx: &ActionContext,
    ) -> Result<Option<KernelResult>, KernelError> {
        let script = ctx.script_content.clone();
        let Some(trigger) = script.trigger(trigger_name) else {
            return Ok(None);
        };
        tracing::debug!(trigger = trigger_name, "applying trigger");
        self.result_for_trigger(trigger, event, ctx, ctx, &[]).map(Some)
    }

    /// Look up the action's handler and compute its ops, with the
    /// action's provenance event merged into the eval context.
    fn ops_for_action(
        &self,
        action: &KernelAction,
        ctx: &ActionContext,
    ) -> Result<Vec<ResultOp>, KernelError> {
        let handler = self
            .registry
            .action(&action.name)
            .ok_or_else(|| KernelError::InvalidAction(action.name.clone()))?;
        let ctx_with_event = ctx.with_event(action.event.as_ref());
        handler.get_ops(&action.params, &ctx_with_event)
    }

    /// Apply an action now, including any triggers started by events it
    /// produces.
    pub fn result_for_immediate_action(
        &self,
        action: &KernelAction,
        ctx: &ActionContext,
        trigger_history: &[String],
    ) -> Result<KernelResult, KernelError> {
        let ops = self.ops_for_action(action, ctx)?;
        let mut result = result_for_ops(ops, ctx);

        // Recurse into any events synthesized by the action.
        let events: Vec<Event> = result
            .result_ops
            .iter()
            .filter_map(|op| match op {
                ResultOp::Event { event, .. } => Some(event.clone()),
                _ => None,
            })
            .collect();
        for event in events {
            let event_result =
                self.result_for_event(&event, &result.next_context, trigger_history)?;
            result = concat_result(result, event_result);
        }
        Ok(result)
    }

    /// Fire the triggers set off by an event, in declaration order.
    pub fn result_for_event(
        &self,
        event: &Event,
        ctx: &ActionContext,
        trigger_history: &[String],
    ) -> Result<KernelResult, KernelError> {
        let mut result = initial_result(ctx);

        // Match triggers with the event visible to their guards. This
        // filters out spent non-repeatable triggers, failing guards, and
        // wrong-scene triggers.
        let ctx_with_event = ctx.with_event(Some(event));
        let firing = triggers_for_event(event, &ctx_with_event, &self.registry)?;

        for trigger in firing {
            // At most once per trigger within one cascade.
            if trigger_history.iter().any(|name| name == &trigger.name) {
                continue;
            }
            let current_ctx = result.next_context.clone();
            let trigger_result =
                self.result_for_trigger(trigger, event, &current_ctx, ctx, trigger_history)?;
            result = concat_result(result, trigger_result);
        }
        Ok(result)
    }

    /// Fire one trigger: record history, resolve its action tree, then
    /// apply or schedule each action in order.
    ///
    /// `ctx` is the running context; `ctx_when_triggered` is the frozen
    /// snapshot from when the trigger was activated. Action guards see
    /// the snapshot; the actions themselves run against the running
    /// context. The asymmetry is deliberate.
    pub fn result_for_trigger(
        &self,
        trigger: &Trigger,
        event: &Event,
        ctx: &ActionContext,
        ctx_when_triggered: &ActionContext,
        trigger_history: &[String],
    ) -> Result<KernelResult, KernelError> {
        // Record history first, so guards inside this trigger's own
        // action tree already observe the just-set entry.
        let fired_at = ctx
            .evaluate_at
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut history = Map::new();
        history.insert(trigger.name.clone(), Value::String(fired_at));
        let history_op = ResultOp::UpdateTripHistory {
            history: history.clone(),
        };
        let mut result = result_for_ops(vec![history_op], ctx);

        let mut extended_history = trigger_history.to_vec();
        extended_history.push(trigger.name.clone());

        // Resolve the action tree against the context as of activation
        // (not intra-trigger mutations), plus the event and this
        // trigger's own just-set history entry.
        let resolution_ctx = ctx_when_triggered
            .with_eval_context(ctx_when_triggered.eval_context.merged_history(&history))
            .with_event(Some(event));
        let evaluator = Evaluator::new(&self.registry);
        let next_actions = actions_for_trigger(trigger, &resolution_ctx, &evaluator)?;

        // Apply or schedule each action, tracking the wait horizon.
        let mut waiting_until = ctx.evaluate_at;
        for clause in next_actions {
            let action = unpack_action(clause, event);

            // Compute the immediate result first - also tells us whether
            // this action is a pure wait signal.
            let action_result = self.result_for_immediate_action(
                &action,
                &result.next_context,
                &extended_history,
            )?;

            let waits: Vec<(Option<i64>, Option<DateTime<Utc>>)> = action_result
                .result_ops
                .iter()
                .filter_map(|op| match op {
                    ResultOp::Wait { seconds, until } => Some((*seconds, *until)),
                    _ => None,
                })
                .collect();
            if !waits.is_empty() {
                // Waits advance the horizon and are never applied or
                // scheduled themselves. Multiple waits combine via max.
                for (seconds, until) in waits {
                    let target = until
                        .unwrap_or_else(|| waiting_until + Duration::seconds(seconds.unwrap_or(0)));
                    waiting_until = waiting_until.max(target);
                }
                continue;
            }

            if waiting_until > ctx.evaluate_at {
                // A prior wait deferred the rest of this trigger's list.
                result.scheduled_actions.push(ScheduledAction {
                    name: action.name,
                    params: action.params,
                    schedule_at: waiting_until,
                    trigger_name: trigger.name.clone(),
                    event: Some(event.clone()),
                });
                continue;
            }

            result = concat_result(result, action_result);
        }

        Ok(result)
    }
}

/// Turn a resolved leaf clause into an executable action carrying its
/// provenance event. The structural `id` key is authoring metadata, not
/// a parameter.
fn unpack_action(clause: tripwright_domain::ActionClause, event: &Event) -> KernelAction {
    let mut params = clause.params;
    params.remove("id");
    KernelAction {
        name: clause.name.unwrap_or_default(),
        params,
        event: Some(event.clone()),
    }
}
