//! Scenario Tests for d2d
//!
//! - Shared: dungeon master and players editing one session live
//! - Shortcuts: keyboard dispatch over the WebSocket channel
//! - Encounter: a full fight from roster setup to the last goblin

pub mod encounter;
