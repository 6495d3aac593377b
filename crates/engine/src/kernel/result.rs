//! Result accumulation and the context fold.
//!
//! A [`KernelResult`] is the output of every kernel-level operation:
//! the next context, the ordered op list, and any scheduled actions.
//! Results compose by concatenation, right-biased on context.
//!
//! [`apply_op_to_context`] is the one shared definition of "what does
//! applying op X mean" for context state. The kernel uses it to preview
//! updates mid-pass so in-flight evaluation observes them before
//! persistence happens; a persistence layer folding the same ops into
//! its stored context must call the same function, or evaluation-time
//! and persisted-time state will diverge.

use tripwright_domain::{ActionContext, EvalContext, ResultOp, ScheduledAction};

/// The aggregated outcome of one kernel-level operation.
#[derive(Debug, Clone)]
pub struct KernelResult {
    pub next_context: ActionContext,
    pub result_ops: Vec<ResultOp>,
    pub scheduled_actions: Vec<ScheduledAction>,
}

/// A blank result anchored at a context.
pub fn initial_result(ctx: &ActionContext) -> KernelResult {
    KernelResult {
        next_context: ctx.clone(),
        result_ops: Vec::new(),
        scheduled_actions: Vec::new(),
    }
}

/// A result carrying the given ops, with the known op kinds folded into
/// the context so subsequent evaluation within the same pass sees them.
pub fn result_for_ops(ops: Vec<ResultOp>, ctx: &ActionContext) -> KernelResult {
    let mut eval_context = ctx.eval_context.clone();
    for op in &ops {
        eval_context = apply_op_to_context(op, &eval_context);
    }
    KernelResult {
        next_context: ctx.with_eval_context(eval_context),
        result_ops: ops,
        scheduled_actions: Vec::new(),
    }
}

/// Concatenate two results: later context wins, ops and scheduled
/// actions append in order.
pub fn concat_result(existing: KernelResult, next: KernelResult) -> KernelResult {
    let mut result_ops = existing.result_ops;
    result_ops.extend(next.result_ops);
    let mut scheduled_actions = existing.scheduled_actions;
    scheduled_actions.extend(next.scheduled_actions);
    KernelResult {
        next_context: next.next_context,
        result_ops,
        scheduled_actions,
    }
}

/// Fold one op into an eval context. Ops outside the known update kinds
/// leave the context unchanged - they are pure side effects interpreted
/// by the persistence layer only.
pub fn apply_op_to_context(op: &ResultOp, eval_context: &EvalContext) -> EvalContext {
    match op {
        ResultOp::UpdateTripFields { fields } => eval_context.merged_at_root(fields),
        ResultOp::UpdateTripValues { values } => eval_context.merged_at_root(values),
        ResultOp::UpdateTripHistory { history } => eval_context.merged_history(history),
        ResultOp::UpdatePlayerFields { role_name, fields } => {
            eval_context.merged_role_fields(role_name, fields)
        }
        _ => eval_context.clone(),
    }
}
