//! Session listing summaries

use serde::Serialize;

use crate::combat::CombatSession;

/// How many entity names a listing label shows
const LABEL_NAMES: usize = 3;

/// The caller's relationship to a listed session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    DungeonMaster,
    Player,
}

/// One row of a session listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub label: String,
    pub role: SessionRole,
    pub dungeon_master: String,
    pub current_round: u32,
    pub entity_count: usize,
    pub alive_count: usize,
    pub player_count: usize,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SessionSummary {
    /// Summarize a session as seen by `user`
    pub fn for_user(session: &CombatSession, user: &str) -> Self {
        let role = if session.is_dungeon_master(user) {
            SessionRole::DungeonMaster
        } else {
            SessionRole::Player
        };

        Self {
            id: session.id.clone(),
            label: session_label(session),
            role,
            dungeon_master: session.dungeon_master.clone(),
            current_round: session.current_round,
            entity_count: session.entities.len(),
            alive_count: session.alive_count(),
            player_count: session.players.len(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// Human-readable name for a session derived from its roster
pub fn session_label(session: &CombatSession) -> String {
    if session.entities.is_empty() {
        return "Empty Combat".to_string();
    }
    if session.alive_count() == 0 {
        return "Combat (All Dead)".to_string();
    }

    let names: Vec<&str> = session
        .entities
        .iter()
        .take(LABEL_NAMES)
        .map(|e| e.name.as_str())
        .collect();
    let mut label = names.join(", ");
    if session.entities.len() > LABEL_NAMES {
        label.push_str(&format!(" +{} more", session.entities.len() - LABEL_NAMES));
    }
    label
}
