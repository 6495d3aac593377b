//! Script document model.
//!
//! A script is the static, author-authored document defining one
//! experience: its scenes, roles, triggers, and resource collections.
//! Scripts arrive pre-validated from the authoring layer; the engine
//! never mutates them at runtime.

use serde::{Deserialize, Serialize};

use crate::trigger::{IfStatement, Trigger};

/// The full content of a script document.
///
/// All collections are optional in the authoring format; missing
/// collections deserialize to empty lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptContent {
    pub scenes: Vec<Scene>,
    pub roles: Vec<Role>,
    pub triggers: Vec<Trigger>,
    pub cues: Vec<Cue>,
    pub pages: Vec<Page>,
    pub messages: Vec<MessageDef>,
    pub geofences: Vec<Geofence>,
    pub times: Vec<TimeDef>,
}

impl ScriptContent {
    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.name == name)
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn trigger(&self, name: &str) -> Option<&Trigger> {
        self.triggers.iter().find(|t| t.name == name)
    }

    pub fn message(&self, name: &str) -> Option<&MessageDef> {
        self.messages.iter().find(|m| m.name == name)
    }

    pub fn geofence(&self, name: &str) -> Option<&Geofence> {
        self.geofences.iter().find(|g| g.name == name)
    }

    /// Pages belonging to a scene and interface, sorted by name.
    ///
    /// Used when a scene starts to pick each role's default page.
    pub fn pages_for_scene_interface(&self, scene: &str, interface: &str) -> Vec<&Page> {
        let mut pages: Vec<&Page> = self
            .pages
            .iter()
            .filter(|p| {
                p.scene.as_deref() == Some(scene) && p.interface.as_deref() == Some(interface)
            })
            .collect();
        pages.sort_by(|a, b| a.name.cmp(&b.name));
        pages
    }
}

/// A scene groups triggers and pages into one phase of the experience.
///
/// Global scenes are always active (subject to their `active_if` guard);
/// non-global scenes are active only while current.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub global: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_if: Option<IfStatement>,
}

/// A participant role. Roles with an `interface` see pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
}

/// A named signal that actions can raise and triggers can listen for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
}

/// A screen shown to a role while its scene is current.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directive: Option<String>,
}

/// A pre-authored message resource, sent via the `send_message` action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageDef {
    pub name: String,
    pub medium: String,
    pub content: String,
    /// Sending role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Default recipient; may be overridden by the action's `to_role_name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// If true, the message is created already-read (no relay).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read: bool,
}

/// A named circular region used to filter location-tagged events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Radius in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// A named schedule slot. Concrete timestamps live in the trip's
/// `schedule` context entry, keyed by this name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_deserializes_with_missing_collections() {
        let script: ScriptContent = serde_json::from_value(serde_json::json!({
            "scenes": [{ "name": "MAIN" }]
        }))
        .expect("script should deserialize");

        assert_eq!(script.scenes.len(), 1);
        assert!(script.triggers.is_empty());
        assert!(script.roles.is_empty());
    }

    #[test]
    fn test_pages_for_scene_interface_sorts_by_name() {
        let script: ScriptContent = serde_json::from_value(serde_json::json!({
            "pages": [
                { "name": "B-PAGE", "scene": "MAIN", "interface": "phone" },
                { "name": "A-PAGE", "scene": "MAIN", "interface": "phone" },
                { "name": "OTHER", "scene": "OTHER", "interface": "phone" }
            ]
        }))
        .expect("script should deserialize");

        let pages = script.pages_for_scene_interface("MAIN", "phone");
        let names: Vec<&str> = pages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A-PAGE", "B-PAGE"]);
    }
}
