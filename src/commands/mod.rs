//! Command surface
//!
//! The finite set of operations a participant can trigger against a
//! session, shared by the keyboard dispatcher, the HTTP endpoint and the
//! WebSocket channel.

mod keys;

use serde::{Deserialize, Serialize};

use crate::combat::{CombatController, EntityDraft, EntityPatch, ValidationError};
pub use keys::{dispatch_key, FocusTarget, KeyEvent, Shortcut};

/// A user-triggerable session operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    AdvanceTurn,
    ResetCombat,
    AddEntity {
        entity: EntityDraft,
    },
    UpdateEntity {
        id: String,
        #[serde(default)]
        patch: EntityPatch,
    },
    DeleteEntity {
        id: String,
    },
    Heal {
        id: String,
        amount: i32,
    },
    Damage {
        id: String,
        amount: i32,
    },
    ToggleStatus {
        id: String,
        status: String,
    },
    AddPlayer {
        player: String,
    },
    RemovePlayer {
        player: String,
    },
}

impl Command {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::AdvanceTurn => "advance_turn",
            Command::ResetCombat => "reset_combat",
            Command::AddEntity { .. } => "add_entity",
            Command::UpdateEntity { .. } => "update_entity",
            Command::DeleteEntity { .. } => "delete_entity",
            Command::Heal { .. } => "heal",
            Command::Damage { .. } => "damage",
            Command::ToggleStatus { .. } => "toggle_status",
            Command::AddPlayer { .. } => "add_player",
            Command::RemovePlayer { .. } => "remove_player",
        }
    }

    /// Commands that change who may access the session
    pub fn requires_dungeon_master(&self) -> bool {
        matches!(self, Command::AddPlayer { .. } | Command::RemovePlayer { .. })
    }

    /// Run the command against a controller.
    ///
    /// Returns true when the session changed and should be persisted.
    /// On a validation error the controller is left untouched.
    pub fn apply(self, controller: &mut CombatController) -> Result<bool, ValidationError> {
        match self {
            Command::AdvanceTurn => Ok(controller.advance_turn()),
            Command::ResetCombat => {
                controller.reset_combat();
                Ok(true)
            }
            Command::AddEntity { entity } => controller.add_entity(entity).map(|_| true),
            Command::UpdateEntity { id, patch } => controller.update_entity(&id, patch),
            Command::DeleteEntity { id } => Ok(controller.delete_entity(&id)),
            Command::Heal { id, amount } => Ok(controller.heal(&id, amount)?.is_some()),
            Command::Damage { id, amount } => Ok(controller.damage(&id, amount)?.is_some()),
            Command::ToggleStatus { id, status } => {
                Ok(controller.toggle_status(&id, &status)?.is_some())
            }
            Command::AddPlayer { player } => controller.add_player(&player),
            Command::RemovePlayer { player } => controller.remove_player(&player),
        }
    }
}
