//! Trigger matching.
//!
//! Given an incoming event, decide which triggers fire: the trigger's
//! scene must be active, its guard must pass, it must not be a spent
//! non-repeatable trigger, and its declared event spec must match the
//! event according to the matcher registered for the event's type.
//! The returned list preserves script declaration order, which is the
//! order triggers apply their effects.

use tripwright_domain::{ActionContext, Event, Trigger};

use crate::error::KernelError;
use crate::eval::Evaluator;
use crate::registry::Registry;

/// Purely time-driven events fire each trigger at most once ever,
/// regardless of the trigger's own repeatable flag - otherwise every
/// scheduler tick past the time would re-fire it.
const TIME_OCCURRED: &str = "time_occurred";

/// Test if a scene is active: global scenes are active whenever their
/// guard passes; non-global scenes only while current. Unknown scenes
/// are never active.
pub fn is_scene_active(
    scene_name: &str,
    ctx: &ActionContext,
    evaluator: &Evaluator<'_>,
) -> Result<bool, KernelError> {
    let Some(scene) = ctx.script_content.scene(scene_name) else {
        return Ok(false);
    };
    if !evaluator.evaluate(&ctx.eval_context, scene.active_if.as_ref())? {
        return Ok(false);
    }
    if scene.global {
        return Ok(true);
    }
    Ok(ctx.eval_context.trip_state().current_scene_name == scene_name)
}

/// Test if a trigger is active for the current context.
pub fn is_trigger_active(
    trigger: &Trigger,
    ctx: &ActionContext,
    evaluator: &Evaluator<'_>,
) -> Result<bool, KernelError> {
    if let Some(scene) = &trigger.scene {
        if !is_scene_active(scene, ctx, evaluator)? {
            return Ok(false);
        }
    }
    if !evaluator.evaluate(&ctx.eval_context, trigger.active_if.as_ref())? {
        return Ok(false);
    }
    if !trigger.is_repeatable() && ctx.eval_context.has_fired(&trigger.name) {
        return Ok(false);
    }
    Ok(true)
}

/// Test if an event sets off a trigger's declared event spec.
pub fn does_event_fire_trigger(
    trigger: &Trigger,
    event: &Event,
    ctx: &ActionContext,
    registry: &Registry,
) -> bool {
    let Some(event_type) = event.event_type() else {
        return false;
    };
    let Some(matcher) = registry.event(event_type) else {
        return false;
    };
    let Some(spec) = trigger.event_spec_for_type(event_type) else {
        return false;
    };
    if event_type == TIME_OCCURRED && ctx.eval_context.has_fired(&trigger.name) {
        return false;
    }
    matcher.match_event(spec, event, ctx)
}

/// The ordered subset of the script's triggers that fire for an event.
pub fn triggers_for_event<'a>(
    event: &Event,
    ctx: &'a ActionContext,
    registry: &Registry,
) -> Result<Vec<&'a Trigger>, KernelError> {
    let Some(event_type) = event.event_type() else {
        return Ok(Vec::new());
    };
    if registry.event(event_type).is_none() {
        // Many event types are purely informational; not an error.
        tracing::warn!(event_type, "no matcher registered for event type, no triggers fire");
        return Ok(Vec::new());
    }
    let evaluator = Evaluator::new(registry);
    let mut firing = Vec::new();
    for trigger in &ctx.script_content.triggers {
        if !is_trigger_active(trigger, ctx, &evaluator)? {
            continue;
        }
        if !does_event_fire_trigger(trigger, event, ctx, registry) {
            continue;
        }
        firing.push(trigger);
    }
    Ok(firing)
}
