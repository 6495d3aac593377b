//! Tripwright engine - the rule evaluation kernel.
//!
//! Authors write declarative scripts (scenes, roles, triggers,
//! conditions, actions); a host feeds the kernel events (messages,
//! timer firings, geofence crossings, cue signals) against a trip's
//! mutable state. One kernel call resolves the full synchronous cascade
//! - triggers fired, actions expanded, nested events followed - into a
//! deterministic, replayable [`KernelResult`]: an ordered list of
//! side-effect ops plus actions scheduled for later passes.
//!
//! The kernel is pure and single-threaded: no I/O, no timers, no
//! persistence. The host applies `result_ops` transactionally and
//! re-invokes the kernel for each `scheduled_action` once due, keeping
//! at most one pass in flight per trip.
//!
//! ```
//! use std::sync::Arc;
//! use tripwright_domain::{ActionContext, EvalContext, KernelAction, ScriptContent};
//! use tripwright_engine::Kernel;
//!
//! let script: ScriptContent = serde_json::from_value(serde_json::json!({
//!     "scenes": [{ "name": "INTRO" }, { "name": "MAIN" }]
//! })).expect("script should parse");
//!
//! let now = chrono::DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp");
//! let ctx = ActionContext::new(Arc::new(script), EvalContext::new(), now);
//! let kernel = Kernel::with_builtins();
//!
//! let action = KernelAction::new("start_scene")
//!     .with_param("scene_name", serde_json::json!("MAIN"));
//! let result = kernel.apply_action(&action, &ctx).expect("pass should evaluate");
//! assert_eq!(result.next_context.eval_context.trip_state().current_scene_name, "MAIN");
//! ```

pub mod error;
pub mod eval;
pub mod geo;
pub mod kernel;
pub mod modules;
pub mod registry;

#[cfg(test)]
mod e2e_tests;
#[cfg(test)]
mod test_fixtures;

pub use error::KernelError;
pub use eval::{lookup_ref, template_text, Evaluator};
pub use kernel::{
    apply_op_to_context, triggers_for_event, walk_action_clauses, Kernel, KernelResult,
};
pub use modules::time::time_for_spec;
pub use registry::{
    ActionHandler, ConditionHandler, EventHandler, Params, RecurseFn, Registry,
};
