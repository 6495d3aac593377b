//! Scene navigation: the `start_scene` action and `scene_started` event.

use std::sync::Arc;

use serde_json::{Map, Value};

use tripwright_domain::{ActionContext, Event, EventSpec, ResultOp};

use crate::error::KernelError;
use crate::registry::{ActionHandler, EventHandler, Params, Registry};

pub fn register(registry: &mut Registry) {
    registry.register_action("start_scene", Arc::new(StartScene));
    registry.register_event("scene_started", Arc::new(SceneStarted));
}

/// Make a scene current, defaulting each interfaced role onto that
/// scene's first page, and announce `scene_started`.
struct StartScene;

impl ActionHandler for StartScene {
    fn get_ops(&self, params: &Params, ctx: &ActionContext) -> Result<Vec<ResultOp>, KernelError> {
        let new_scene_name = params
            .get("scene_name")
            .and_then(Value::as_str)
            .unwrap_or("");
        let Some(new_scene) = ctx.script_content.scene(new_scene_name) else {
            return Ok(vec![ResultOp::log_error(format!(
                "Could not find scene named \"{new_scene_name}\"."
            ))]);
        };

        // Don't change scene if it's already current.
        let trip_state = ctx.eval_context.trip_state();
        if trip_state.current_scene_name == new_scene_name {
            return Ok(Vec::new());
        }
        // Can't set current scene to a global one.
        if new_scene.global {
            return Ok(Vec::new());
        }

        // Changing scene drops each role's current page; if the new
        // scene has pages for that role's interface, auto-nav to the
        // first one sorted by name.
        let mut new_page_names_by_role = Map::new();
        for role in &ctx.script_content.roles {
            let Some(interface) = &role.interface else {
                continue;
            };
            let pages = ctx
                .script_content
                .pages_for_scene_interface(new_scene_name, interface);
            if let Some(first) = pages.first() {
                new_page_names_by_role
                    .insert(role.name.clone(), Value::String(first.name.clone()));
            }
        }

        let mut trip_state_value = Map::new();
        trip_state_value.insert(
            "currentSceneName".to_string(),
            Value::String(new_scene_name.to_string()),
        );
        trip_state_value.insert(
            "currentPageNamesByRole".to_string(),
            Value::Object(new_page_names_by_role),
        );
        let mut fields = Map::new();
        fields.insert("tripState".to_string(), Value::Object(trip_state_value));

        Ok(vec![
            ResultOp::UpdateTripFields { fields },
            ResultOp::event(
                Event::new("scene_started")
                    .with_field("scene", Value::String(new_scene_name.to_string())),
            ),
        ])
    }
}

/// Matches any scene start. Which scene a trigger cares about is its
/// own `scene` placement, checked by the activity filter - so the
/// matcher itself accepts every `scene_started` event.
struct SceneStarted;

impl EventHandler for SceneStarted {
    fn match_event(&self, _spec: &EventSpec, _event: &Event, _ctx: &ActionContext) -> bool {
        true
    }
}
