//! Cues: the `signal_cue` action and `cue_signaled` event.

use std::sync::Arc;

use serde_json::Value;

use tripwright_domain::{ActionContext, Event, EventSpec, ResultOp};

use crate::error::KernelError;
use crate::registry::{ActionHandler, EventHandler, Params, Registry};

pub fn register(registry: &mut Registry) {
    registry.register_action("signal_cue", Arc::new(SignalCue));
    registry.register_event("cue_signaled", Arc::new(CueSignaled));
}

/// Raise a named cue. The cue itself does nothing; triggers listening
/// for it do the work.
struct SignalCue;

impl ActionHandler for SignalCue {
    fn get_ops(&self, params: &Params, _ctx: &ActionContext) -> Result<Vec<ResultOp>, KernelError> {
        let cue_name = params.get("cue_name").and_then(Value::as_str).unwrap_or("");
        Ok(vec![ResultOp::event(
            Event::new("cue_signaled").with_field("cue", Value::String(cue_name.to_string())),
        )])
    }
}

/// Matches when the spec names the signaled cue.
struct CueSignaled;

impl EventHandler for CueSignaled {
    fn match_event(&self, spec: &EventSpec, event: &Event, _ctx: &ActionContext) -> bool {
        spec.get_str("cue").is_some() && spec.get_str("cue") == event.get_str("cue")
    }
}
