//! Built-in action, condition, and event vocabulary.
//!
//! Each module registers its handlers through the same registry API a
//! host extension would use. The kernel itself knows none of these by
//! name (except the internal `wait` op kind and the structural
//! `conditional` clause, which are not handlers).

pub mod cues;
pub mod logs;
pub mod messages;
pub mod pages;
pub mod scenes;
pub mod time;
pub mod values;

use crate::registry::Registry;

/// Wire the stock module vocabulary into a registry.
pub fn register_builtins(registry: &mut Registry) {
    values::register(registry);
    scenes::register(registry);
    cues::register(registry);
    pages::register(registry);
    messages::register(registry);
    time::register(registry);
    logs::register(registry);
}
