//! Triggers and their action-clause trees.
//!
//! A trigger is a named rule: an event pattern, optional guards, and a
//! tree of action clauses. The tree nests `conditional` branches
//! (`if` / `elseifs` / `else`) arbitrarily; the engine's resolver
//! flattens whichever branches pass into an ordered action list.
//!
//! Conditions and action parameters are kept as open JSON maps because
//! their vocabularies are registry-driven: the engine dispatches on
//! `op` / `name` and hands the rest to the registered handler.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::event::EventSpec;

/// A boolean condition node: `{ "op": ..., ...params }`.
///
/// `and`/`or` carry nested nodes under `items`; `not` carries one under
/// `item`; leaf predicates carry whatever their handler defines. An
/// absent condition always evaluates to true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IfStatement {
    pub op: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl IfStatement {
    pub fn new(op: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

/// One `elseif` arm of a conditional clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElseIf {
    #[serde(rename = "if")]
    pub if_: IfStatement,
    #[serde(default)]
    pub actions: Vec<ActionClause>,
}

/// One entry in a trigger's action list: either a concrete action
/// (`{ "name": ..., ...params }`) or a nested conditional.
///
/// The authoring format stores both shapes as plain objects, so this
/// struct carries the union: a clause is conditional when its name is
/// `"conditional"` or it has an `if` key, and a leaf action otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionClause {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub if_: Option<IfStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionClause>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elseifs: Option<Vec<ElseIf>>,
    #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
    pub else_: Option<Vec<ActionClause>>,
    /// Leaf-action parameters (everything but the structural keys).
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl ActionClause {
    /// A concrete leaf action with the given name.
    pub fn action(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// True when this clause is a conditional branch node rather than a
    /// concrete action.
    pub fn is_conditional(&self) -> bool {
        match self.name.as_deref() {
            Some("conditional") => true,
            Some(_) => false,
            None => true,
        }
    }
}

/// A named rule: event pattern + guards + an action tree.
///
/// Triggers are defined statically in the script and never mutated at
/// runtime; the only runtime trace of one is its entry in the trip's
/// history map, recording the last time it fired.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub name: String,
    /// Single event spec (authoring shorthand for a one-element list).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EventSpec>,
    /// Event specs this trigger listens for, matched by event type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventSpec>,
    /// Scene this trigger belongs to; the trigger only fires while that
    /// scene is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_if: Option<IfStatement>,
    /// Defaults to true; a non-repeatable trigger is spent once fired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeatable: Option<bool>,
    #[serde(default)]
    pub actions: Vec<ActionClause>,
}

impl Trigger {
    pub fn is_repeatable(&self) -> bool {
        self.repeatable.unwrap_or(true)
    }

    /// The first declared event spec whose type matches, searching the
    /// single `event` field first and then the `events` list.
    pub fn event_spec_for_type(&self, event_type: &str) -> Option<&EventSpec> {
        self.event
            .iter()
            .chain(self.events.iter())
            .find(|spec| spec.event_type() == Some(event_type))
    }
}
