//! Combat session module
//!
//! Implements the turn-based combat tracker core:
//! - Combatants with health, initiative and status tags
//! - Initiative-ordered turn view
//! - Turn and round advancement
//! - Heal, damage and status toggling with clamping rules

mod entity;
mod error;
mod order;
mod session;

pub use entity::{
    parse_statuses, Entity, EntityDraft, EntityPatch, StatusTag, DEFAULT_HEALTH,
    DEFAULT_INITIATIVE,
};
pub use error::ValidationError;
pub use order::{current_actor, turn_order};
pub use session::{now_millis, CombatController, CombatSession};
