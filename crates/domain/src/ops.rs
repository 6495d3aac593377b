//! Result ops and scheduled actions - the kernel's output vocabulary.
//!
//! A [`ResultOp`] describes one side effect for an external persistence
//! layer to apply. Ops are pure data, ordered, and replayable: applying
//! the same ordered op list to the same starting state must match what
//! the kernel's own context folding computed during evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::event::Event;

/// Severity for `log` ops. Soft business failures inside action handlers
/// (missing message, unknown role) surface as `error`/`warning` logs and
/// the cascade continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warning,
    Info,
}

/// Fields of a message row to be created by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageFields {
    pub sent_by_role_name: String,
    pub sent_to_role_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
    /// Name of the message resource, if sent from one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub medium: String,
    pub content: String,
}

/// Fanout scope for synthesized events: beyond the current trip, an
/// event can be replayed against sibling trips by the host layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventScope {
    Trip,
    Group,
    Experience,
}

/// A description of one side effect, to be applied externally.
///
/// The `wait` kind is an internal scheduling signal consumed by the
/// kernel's trigger loop; it never reaches the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum ResultOp {
    UpdateTripFields {
        fields: Map<String, Value>,
    },
    UpdateTripValues {
        values: Map<String, Value>,
    },
    UpdateTripHistory {
        history: Map<String, Value>,
    },
    #[serde(rename_all = "camelCase")]
    UpdatePlayerFields {
        role_name: String,
        fields: Map<String, Value>,
    },
    CreateMessage {
        fields: MessageFields,
    },
    /// A synthetic event: recursed into by the kernel, and surfaced for
    /// audit (and for cross-trip fanout when `scope` is set).
    Event {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<EventScope>,
        event: Event,
    },
    Log {
        level: LogLevel,
        message: String,
    },
    /// Internal-only: defer subsequent actions of the same trigger.
    Wait {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seconds: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        until: Option<DateTime<Utc>>,
    },
}

impl ResultOp {
    pub fn log_error(message: impl Into<String>) -> Self {
        Self::Log {
            level: LogLevel::Error,
            message: message.into(),
        }
    }

    pub fn log_warning(message: impl Into<String>) -> Self {
        Self::Log {
            level: LogLevel::Warning,
            message: message.into(),
        }
    }

    pub fn event(event: Event) -> Self {
        Self::Event { scope: None, event }
    }

    pub fn is_wait(&self) -> bool {
        matches!(self, Self::Wait { .. })
    }
}

/// A fully-resolved, about-to-execute action invocation. Carries the
/// event (if any) that is its provenance for guard and template context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KernelAction {
    pub name: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}

impl KernelAction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// An action whose execution is deferred to a future evaluation pass.
/// The host scheduler must re-invoke the kernel at or after
/// `schedule_at`; the kernel holds no timers of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledAction {
    pub name: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    pub schedule_at: DateTime<Utc>,
    pub trigger_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}
