//! Value-object parsers shared by the engine and hosts.

pub mod duration;
