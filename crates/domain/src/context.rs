//! Evaluation contexts.
//!
//! [`EvalContext`] is the dynamic variable bag visible to condition and
//! template evaluation: trip values at the root, role sub-objects, the
//! `history` map (trigger name -> last-fired timestamp), `tripState`,
//! `schedule`, and - while an event is being processed - the `event`
//! itself. Scripts define arbitrary value names, so the bag is an open
//! JSON map with typed accessors for the known keys.
//!
//! Both context types are immutable per evaluation step: every update
//! helper returns a new context.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::event::Event;
use crate::script::ScriptContent;

/// Trip-level navigation state, stored under the `tripState` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TripState {
    pub current_scene_name: String,
    pub current_page_names_by_role: Map<String, Value>,
}

/// The dynamic variable bag for one trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvalContext(Map<String, Value>);

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Resolve a dotted path (`"Farmer.currentPageName"`) into the bag.
    /// Numeric segments index into arrays. Absent paths resolve to None.
    pub fn lookup_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// The trip navigation state, defaulting when absent or malformed.
    pub fn trip_state(&self) -> TripState {
        self.0
            .get("tripState")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    /// Last-fired timestamp for a trigger, if any.
    pub fn history_entry(&self, trigger_name: &str) -> Option<&Value> {
        self.0
            .get("history")
            .and_then(Value::as_object)
            .and_then(|history| history.get(trigger_name))
    }

    /// Whether a trigger has fired before on this trip.
    pub fn has_fired(&self, trigger_name: &str) -> bool {
        self.history_entry(trigger_name)
            .is_some_and(|entry| !entry.is_null())
    }

    /// A named schedule timestamp, parsed from the `schedule` map.
    pub fn schedule_time(&self, time_name: &str) -> Option<DateTime<Utc>> {
        self.0
            .get("schedule")
            .and_then(Value::as_object)
            .and_then(|schedule| schedule.get(time_name))
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse::<DateTime<Utc>>().ok())
    }

    /// A copy of this context with `event` set (null when absent).
    pub fn with_event(&self, event: Option<&Event>) -> Self {
        let mut next = self.0.clone();
        let value = event.map(Event::to_value).unwrap_or(Value::Null);
        next.insert("event".to_string(), value);
        Self(next)
    }

    /// A copy with the given fields merged at the root.
    pub fn merged_at_root(&self, fields: &Map<String, Value>) -> Self {
        let mut next = self.0.clone();
        for (key, value) in fields {
            next.insert(key.clone(), value.clone());
        }
        Self(next)
    }

    /// A copy with the given entries merged into the `history` map.
    pub fn merged_history(&self, history: &Map<String, Value>) -> Self {
        let mut next = self.0.clone();
        let mut merged = next
            .get("history")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for (key, value) in history {
            merged.insert(key.clone(), value.clone());
        }
        next.insert("history".to_string(), Value::Object(merged));
        Self(next)
    }

    /// A copy with the given fields merged into a role's sub-object.
    pub fn merged_role_fields(&self, role_name: &str, fields: &Map<String, Value>) -> Self {
        let mut next = self.0.clone();
        let mut role = next
            .get(role_name)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for (key, value) in fields {
            role.insert(key.clone(), value.clone());
        }
        next.insert(role_name.to_string(), Value::Object(role));
        Self(next)
    }
}

/// The ambient evaluation environment, passed by value through the whole
/// call chain. Nothing mutates it in place: every update produces a new
/// `ActionContext` with a new [`EvalContext`].
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// The static script document. Shared, never mutated.
    pub script_content: Arc<ScriptContent>,
    pub eval_context: EvalContext,
    /// The logical timestamp of this evaluation pass; decides immediate
    /// vs. scheduled execution.
    pub evaluate_at: DateTime<Utc>,
    /// Display offset for clock times in templated text. Resolving IANA
    /// zone names to an offset is the host's job.
    pub timezone: Option<FixedOffset>,
    pub current_role_name: Option<String>,
}

impl ActionContext {
    pub fn new(
        script_content: Arc<ScriptContent>,
        eval_context: EvalContext,
        evaluate_at: DateTime<Utc>,
    ) -> Self {
        Self {
            script_content,
            eval_context,
            evaluate_at,
            timezone: None,
            current_role_name: None,
        }
    }

    /// A copy carrying a different eval context.
    pub fn with_eval_context(&self, eval_context: EvalContext) -> Self {
        Self {
            eval_context,
            ..self.clone()
        }
    }

    /// A copy whose eval context carries the given event (null if none).
    pub fn with_event(&self, event: Option<&Event>) -> Self {
        self.with_eval_context(self.eval_context.with_event(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context_from(value: Value) -> EvalContext {
        serde_json::from_value(value).expect("context should deserialize")
    }

    #[test]
    fn test_lookup_path_resolves_nested_values() {
        let ctx = context_from(json!({
            "Farmer": { "currentPageName": "TRACTOR" },
            "apples": 2
        }));

        assert_eq!(
            ctx.lookup_path("Farmer.currentPageName"),
            Some(&json!("TRACTOR"))
        );
        assert_eq!(ctx.lookup_path("apples"), Some(&json!(2)));
        assert_eq!(ctx.lookup_path("Farmer.missing"), None);
        assert_eq!(ctx.lookup_path("missing.path"), None);
    }

    #[test]
    fn test_trip_state_defaults_when_absent() {
        let ctx = EvalContext::new();
        assert_eq!(ctx.trip_state().current_scene_name, "");

        let ctx = context_from(json!({
            "tripState": { "currentSceneName": "SCENE-1" }
        }));
        assert_eq!(ctx.trip_state().current_scene_name, "SCENE-1");
    }

    #[test]
    fn test_merged_history_preserves_existing_entries() {
        let ctx = context_from(json!({ "history": { "t1": "2023-01-01T00:00:00Z" } }));

        let mut update = Map::new();
        update.insert("t2".to_string(), json!("2023-01-02T00:00:00Z"));
        let next = ctx.merged_history(&update);

        assert!(next.has_fired("t1"));
        assert!(next.has_fired("t2"));
        assert!(!ctx.has_fired("t2"));
    }

    #[test]
    fn test_merged_role_fields_overlays_existing_role() {
        let ctx = context_from(json!({ "Farmer": { "currentPageName": "TRACTOR", "link": "x" } }));

        let mut fields = Map::new();
        fields.insert("currentPageName".to_string(), json!("BACK-HOME"));
        let next = ctx.merged_role_fields("Farmer", &fields);

        assert_eq!(
            next.lookup_path("Farmer.currentPageName"),
            Some(&json!("BACK-HOME"))
        );
        assert_eq!(next.lookup_path("Farmer.link"), Some(&json!("x")));
    }

    #[test]
    fn test_with_event_sets_null_when_absent() {
        let ctx = EvalContext::new().with_event(None);
        assert_eq!(ctx.get("event"), Some(&Value::Null));
    }

    #[test]
    fn test_schedule_time_parses_iso_timestamps() {
        let ctx = context_from(json!({
            "schedule": { "t": "2023-05-01T12:00:00.000Z" }
        }));

        let parsed = ctx.schedule_time("t").expect("time should parse");
        assert_eq!(parsed.to_rfc3339(), "2023-05-01T12:00:00+00:00");
        assert_eq!(ctx.schedule_time("missing"), None);
    }
}
