//! Messaging: `send_message` / `send_text` actions and the
//! `message_received` event.

use std::sync::Arc;

use serde_json::Value;

use tripwright_domain::{ActionContext, Event, EventSpec, MessageFields, ResultOp};

use crate::error::KernelError;
use crate::eval::template_text;
use crate::geo::distance_meters;
use crate::registry::{ActionHandler, EventHandler, Params, Registry};

pub fn register(registry: &mut Registry) {
    registry.register_action("send_message", Arc::new(SendMessage));
    registry.register_action("send_text", Arc::new(SendText));
    registry.register_event("message_received", Arc::new(MessageReceived));
    registry.register_event("geofence_entered", Arc::new(GeofenceCrossed));
    registry.register_event("geofence_exited", Arc::new(GeofenceCrossed));
}

fn received_event(from: &str, to: &str, medium: &str, content: &str) -> Event {
    let mut message = serde_json::Map::new();
    message.insert("from".to_string(), Value::String(from.to_string()));
    message.insert("to".to_string(), Value::String(to.to_string()));
    message.insert("medium".to_string(), Value::String(medium.to_string()));
    message.insert("content".to_string(), Value::String(content.to_string()));
    Event::new("message_received").with_field("message", Value::Object(message))
}

/// Send a pre-authored message resource from its defined sender.
struct SendMessage;

impl ActionHandler for SendMessage {
    fn get_ops(&self, params: &Params, ctx: &ActionContext) -> Result<Vec<ResultOp>, KernelError> {
        let name = params
            .get("message_name")
            .and_then(Value::as_str)
            .unwrap_or("");
        let Some(message_def) = ctx.script_content.message(name) else {
            return Ok(vec![ResultOp::log_error(format!(
                "Could not find message named \"{name}\"."
            ))]);
        };
        let to_role_name = params
            .get("to_role_name")
            .and_then(Value::as_str)
            .or(message_def.to.as_deref());
        let Some(to_role_name) = to_role_name else {
            return Ok(vec![ResultOp::log_error(format!(
                "Message \"{name}\" has no recipient."
            ))]);
        };
        let from_role_name = message_def.from.clone().unwrap_or_default();
        let content = template_text(
            &ctx.eval_context,
            &Value::String(message_def.content.clone()),
            ctx.timezone,
        );

        Ok(vec![
            ResultOp::CreateMessage {
                fields: MessageFields {
                    sent_by_role_name: from_role_name.clone(),
                    sent_to_role_name: to_role_name.to_string(),
                    created_at: ctx.evaluate_at,
                    read_at: message_def.read.then_some(ctx.evaluate_at),
                    name: Some(name.to_string()),
                    medium: message_def.medium.clone(),
                    content: content.clone(),
                },
            },
            ResultOp::event(received_event(
                &from_role_name,
                to_role_name,
                &message_def.medium,
                &content,
            )),
        ])
    }
}

/// Send an ad-hoc text from one role to another.
struct SendText;

impl ActionHandler for SendText {
    fn get_ops(&self, params: &Params, ctx: &ActionContext) -> Result<Vec<ResultOp>, KernelError> {
        let from_role_name = params
            .get("from_role_name")
            .and_then(Value::as_str)
            .unwrap_or("");
        let to_role_name = params
            .get("to_role_name")
            .and_then(Value::as_str)
            .unwrap_or("");
        let content = template_text(
            &ctx.eval_context,
            params.get("content").unwrap_or(&Value::Null),
            ctx.timezone,
        );

        let mut event = received_event(from_role_name, to_role_name, "text", &content);
        // Carry the sender's location if supplied, for geofence filters.
        let mut location = serde_json::Map::new();
        for key in ["latitude", "longitude", "accuracy"] {
            location.insert(key.to_string(), params.get(key).cloned().unwrap_or(Value::Null));
        }
        event = event.with_field("location", Value::Object(location));

        Ok(vec![
            ResultOp::CreateMessage {
                fields: MessageFields {
                    sent_by_role_name: from_role_name.to_string(),
                    sent_to_role_name: to_role_name.to_string(),
                    created_at: ctx.evaluate_at,
                    read_at: None,
                    name: None,
                    medium: "text".to_string(),
                    content,
                },
            },
            ResultOp::event(event),
        ])
    }
}

/// Matches received messages against medium / sender / recipient /
/// content / geofence filters. Every filter is optional; an absent
/// filter matches everything.
struct MessageReceived;

impl EventHandler for MessageReceived {
    fn match_event(&self, spec: &EventSpec, event: &Event, ctx: &ActionContext) -> bool {
        let Some(message) = event.get("message").and_then(Value::as_object) else {
            return false;
        };
        let message_str = |key: &str| message.get(key).and_then(Value::as_str);

        if let Some(medium) = spec.get_str("medium") {
            if message_str("medium") != Some(medium) {
                return false;
            }
        }
        if let Some(from) = spec.get_str("from") {
            if message_str("from") != Some(from) {
                return false;
            }
        }
        if let Some(to) = spec.get_str("to") {
            if message_str("to") != Some(to) {
                return false;
            }
        }
        if let Some(part) = spec.get_str("contains") {
            let content = message_str("content").unwrap_or("");
            if !content.to_lowercase().contains(&part.to_lowercase()) {
                return false;
            }
        }
        if let Some(geofence_name) = spec.get_str("geofence") {
            if !location_within_geofence(event, geofence_name, ctx) {
                return false;
            }
        }
        true
    }
}

fn location_within_geofence(event: &Event, geofence_name: &str, ctx: &ActionContext) -> bool {
    let location = event.get("location").and_then(Value::as_object);
    let coord = |key: &str| {
        location
            .and_then(|loc| loc.get(key))
            .and_then(Value::as_f64)
    };
    let (Some(latitude), Some(longitude)) = (coord("latitude"), coord("longitude")) else {
        return false;
    };
    let Some(geofence) = ctx.script_content.geofence(geofence_name) else {
        return false;
    };
    let (Some(center_lat), Some(center_lng), Some(radius)) =
        (geofence.latitude, geofence.longitude, geofence.distance)
    else {
        return false;
    };
    let dist = distance_meters(latitude, longitude, center_lat, center_lng);
    // Grant a grace range of the location accuracy, capped so a wide
    // accuracy circle can't cause erroneous matches.
    let max_accuracy = 15.0;
    let accuracy = coord("accuracy").unwrap_or(0.0).min(max_accuracy);
    dist <= radius + accuracy
}

/// Matches geofence entry/exit by role and geofence name.
struct GeofenceCrossed;

impl EventHandler for GeofenceCrossed {
    fn match_event(&self, spec: &EventSpec, event: &Event, _ctx: &ActionContext) -> bool {
        if let Some(role) = spec.get_str("role") {
            if event.get_str("role") != Some(role) {
                return false;
            }
        }
        if let Some(geofence) = spec.get_str("geofence") {
            if event.get_str("geofence") != Some(geofence) {
                return false;
            }
        }
        true
    }
}
