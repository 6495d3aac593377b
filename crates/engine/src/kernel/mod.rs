//! The evaluation kernel and its supporting algorithms.

pub mod actions;
#[allow(clippy::module_inception)]
pub mod kernel;
pub mod result;
pub mod triggers;

pub use actions::{actions_for_trigger, resolve_clause, walk_action_clauses};
pub use kernel::Kernel;
pub use result::{apply_op_to_context, concat_result, initial_result, result_for_ops, KernelResult};
pub use triggers::{
    does_event_fire_trigger, is_scene_active, is_trigger_active, triggers_for_event,
};
