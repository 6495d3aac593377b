//! Wait-based scheduling: wait actions split a trigger's action list
//! into an immediate part and a deferred part.

use chrono::Duration;
use serde_json::json;

use tripwright_domain::{Event, ScheduledAction, Trigger};

use crate::kernel::Kernel;
use crate::test_fixtures::{action_context_with, fixed_now, fixed_now_iso};

fn trigger_from(value: serde_json::Value) -> Trigger {
    serde_json::from_value(value).expect("trigger should deserialize")
}

fn cue_event() -> Event {
    Event::new("cue_signaled").with_field("cue", json!("CUE"))
}

#[test]
fn test_wait_delays_subsequent_actions() {
    let ctx = action_context_with(json!({}), json!({}));
    let kernel = Kernel::with_builtins();
    let trigger = trigger_from(json!({
        "name": "trigger1",
        "event": { "type": "cue_signaled", "cue": "CUE" },
        "actions": [
            { "name": "set_value", "value_ref": "a", "new_value_ref": "10" },
            { "name": "wait", "duration": "10s" },
            { "name": "set_value", "value_ref": "b", "new_value_ref": "20" }
        ]
    }));
    let event = cue_event();

    let result = kernel
        .result_for_trigger(&trigger, &event, &ctx, &ctx, &[])
        .expect("pass should evaluate");

    assert_eq!(
        serde_json::to_value(&result.result_ops).expect("ops serialize"),
        json!([
            {
                "operation": "updateTripHistory",
                "history": { "trigger1": fixed_now_iso() }
            },
            { "operation": "updateTripValues", "values": { "a": 10 } }
        ])
    );
    assert_eq!(
        result.scheduled_actions,
        vec![ScheduledAction {
            name: "set_value".to_string(),
            params: serde_json::from_value(json!({ "value_ref": "b", "new_value_ref": "20" }))
                .expect("params"),
            schedule_at: fixed_now() + Duration::seconds(10),
            trigger_name: "trigger1".to_string(),
            event: Some(event),
        }]
    );
    // The deferred action's value is NOT folded into the next context.
    assert_eq!(
        serde_json::to_value(result.next_context.eval_context.as_map()).expect("context"),
        json!({ "a": 10, "history": { "trigger1": fixed_now_iso() } })
    );
}

#[test]
fn test_sequential_waits_accumulate() {
    let ctx = action_context_with(json!({}), json!({}));
    let kernel = Kernel::with_builtins();
    let trigger = trigger_from(json!({
        "name": "trigger1",
        "event": { "type": "cue_signaled", "cue": "CUE" },
        "actions": [
            { "name": "wait", "duration": "20s" },
            { "name": "wait", "duration": "20s" },
            { "name": "set_value", "value_ref": "c", "new_value_ref": "1" }
        ]
    }));

    let result = kernel
        .result_for_trigger(&trigger, &cue_event(), &ctx, &ctx, &[])
        .expect("pass should evaluate");

    assert_eq!(result.scheduled_actions.len(), 1);
    assert_eq!(
        result.scheduled_actions[0].schedule_at,
        fixed_now() + Duration::seconds(40)
    );
    // Only the history op applies now; waits are never persisted.
    assert_eq!(result.result_ops.len(), 1);
}

#[test]
fn test_wait_for_time_schedules_at_named_time() {
    let in_one_minute = (fixed_now() + Duration::minutes(1))
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let ctx = action_context_with(json!({}), json!({ "schedule": { "t": in_one_minute } }));
    let kernel = Kernel::with_builtins();
    let trigger = trigger_from(json!({
        "name": "trigger1",
        "event": { "type": "cue_signaled", "cue": "CUE" },
        "actions": [
            { "name": "wait_for_time", "until": "t" },
            { "name": "set_value", "value_ref": "b", "new_value_ref": "20" }
        ]
    }));

    let result = kernel
        .result_for_trigger(&trigger, &cue_event(), &ctx, &ctx, &[])
        .expect("pass should evaluate");

    assert_eq!(result.result_ops.len(), 1, "only the history op applies now");
    assert_eq!(result.scheduled_actions.len(), 1);
    assert_eq!(
        result.scheduled_actions[0].schedule_at,
        fixed_now() + Duration::minutes(1)
    );
    assert_eq!(result.scheduled_actions[0].name, "set_value");
}

#[test]
fn test_wait_before_time_schedules_ahead_of_named_time() {
    let in_one_minute = (fixed_now() + Duration::minutes(1))
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let ctx = action_context_with(json!({}), json!({ "schedule": { "t": in_one_minute } }));
    let kernel = Kernel::with_builtins();
    let trigger = trigger_from(json!({
        "name": "trigger1",
        "event": { "type": "cue_signaled", "cue": "CUE" },
        "actions": [
            { "name": "set_value", "value_ref": "a", "new_value_ref": "10" },
            { "name": "wait_before_time", "until": "t", "before": "10s" },
            { "name": "set_value", "value_ref": "b", "new_value_ref": "20" }
        ]
    }));

    let result = kernel
        .result_for_trigger(&trigger, &cue_event(), &ctx, &ctx, &[])
        .expect("pass should evaluate");

    assert_eq!(result.scheduled_actions.len(), 1);
    assert_eq!(
        result.scheduled_actions[0].schedule_at,
        fixed_now() + Duration::seconds(50)
    );
    assert_eq!(
        result.next_context.eval_context.get("a"),
        Some(&json!(10)),
        "actions before the wait apply immediately"
    );
    assert_eq!(result.next_context.eval_context.get("b"), None);
}

#[test]
fn test_everything_after_a_wait_defers_together() {
    let ctx = action_context_with(json!({}), json!({}));
    let kernel = Kernel::with_builtins();
    let trigger = trigger_from(json!({
        "name": "trigger1",
        "event": { "type": "cue_signaled", "cue": "CUE" },
        "actions": [
            { "name": "wait", "duration": "30s" },
            { "name": "set_value", "value_ref": "a", "new_value_ref": "1" },
            { "name": "set_value", "value_ref": "b", "new_value_ref": "2" }
        ]
    }));

    let result = kernel
        .result_for_trigger(&trigger, &cue_event(), &ctx, &ctx, &[])
        .expect("pass should evaluate");

    let names: Vec<&str> = result
        .scheduled_actions
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(names, vec!["set_value", "set_value"]);
    for scheduled in &result.scheduled_actions {
        assert_eq!(scheduled.schedule_at, fixed_now() + Duration::seconds(30));
        assert_eq!(scheduled.trigger_name, "trigger1");
    }
}
