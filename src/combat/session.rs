//! Combat session state
//!
//! Holds one tracked encounter:
//! - The entity roster
//! - Turn and round counters
//! - Dungeon master and players
//!
//! `CombatSession` is the persisted document. `CombatController` owns one
//! in-memory copy and is the only way to mutate it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::entity::{Entity, EntityDraft, EntityPatch, StatusTag};
use super::error::ValidationError;
use super::order::{current_actor, turn_order};

/// Current time as Unix epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The shared session document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatSession {
    pub id: String,
    /// Roster in arrival order; turn order is derived
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Positional index into the turn-ordered view
    pub current_turn_index: usize,
    /// Starts at 1, only reset explicitly
    pub current_round: u32,
    /// Owning user, fixed at creation
    pub dungeon_master: String,
    /// Users granted read/write access
    #[serde(default)]
    pub players: Vec<String>,
    /// Unix epoch milliseconds
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed on every persisted write
    pub updated_at: i64,
}

impl CombatSession {
    /// Create an empty session owned by `dungeon_master`
    pub fn new(id: impl Into<String>, dungeon_master: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: id.into(),
            entities: Vec::new(),
            current_turn_index: 0,
            current_round: 1,
            dungeon_master: dungeon_master.into(),
            players: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the user owns this session
    pub fn is_dungeon_master(&self, user: &str) -> bool {
        self.dungeon_master == user
    }

    /// Whether the user is the dungeon master or a player
    pub fn can_access(&self, user: &str) -> bool {
        self.is_dungeon_master(user) || self.players.iter().any(|p| p == user)
    }

    /// Number of entities still standing
    pub fn alive_count(&self) -> usize {
        self.entities.iter().filter(|e| !e.is_dead()).count()
    }
}

/// Owns one in-memory session and executes mutations against it
#[derive(Debug, Clone)]
pub struct CombatController {
    session: CombatSession,
}

impl CombatController {
    /// Take ownership of a session
    pub fn new(session: CombatSession) -> Self {
        Self { session }
    }

    /// Read-only view of the session
    pub fn session(&self) -> &CombatSession {
        &self.session
    }

    /// Give up the session
    pub fn into_session(self) -> CombatSession {
        self.session
    }

    /// Session identifier
    pub fn id(&self) -> &str {
        &self.session.id
    }

    /// Roster in arrival order
    pub fn entities(&self) -> &[Entity] {
        &self.session.entities
    }

    /// Look up an entity
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.session.entities.iter().find(|e| e.id == id)
    }

    fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.session.entities.iter_mut().find(|e| e.id == id)
    }

    /// Entities in turn order
    pub fn ordered(&self) -> Vec<&Entity> {
        turn_order(&self.session.entities)
    }

    /// Entity whose turn it is, if the index points into the view
    pub fn current_actor(&self) -> Option<&Entity> {
        current_actor(&self.ordered(), self.session.current_turn_index)
    }

    pub fn current_turn_index(&self) -> usize {
        self.session.current_turn_index
    }

    pub fn current_round(&self) -> u32 {
        self.session.current_round
    }

    /// Number of entities with health above zero
    pub fn alive_count(&self) -> usize {
        self.session.alive_count()
    }

    /// Whether the user may read and write this session
    pub fn can_access(&self, user: &str) -> bool {
        self.session.can_access(user)
    }

    /// Move to the next actor, wrapping into a new round after the last.
    ///
    /// The wrap point is the length of the view at the time of the call.
    /// Returns false when the roster is empty.
    pub fn advance_turn(&mut self) -> bool {
        let len = self.session.entities.len();
        if len == 0 {
            return false;
        }

        let next = self.session.current_turn_index + 1;
        if next >= len {
            self.session.current_turn_index = 0;
            self.session.current_round = self.session.current_round.saturating_add(1);
            debug!(
                "session {} entering round {}",
                self.session.id, self.session.current_round
            );
        } else {
            self.session.current_turn_index = next;
        }
        true
    }

    /// Back to round 1, first actor, with every status cleared
    pub fn reset_combat(&mut self) {
        self.session.current_turn_index = 0;
        self.session.current_round = 1;
        for entity in &mut self.session.entities {
            entity.statuses.clear();
        }
        debug!("session {} reset", self.session.id);
    }

    /// Validate a draft and append it to the roster. Returns the new id.
    pub fn add_entity(&mut self, draft: EntityDraft) -> Result<String, ValidationError> {
        let id = self.fresh_entity_id();
        let entity = draft.into_entity(id.clone())?;
        debug!("session {} adding entity {} ({})", self.session.id, entity.name, id);
        self.session.entities.push(entity);
        Ok(id)
    }

    fn fresh_entity_id(&self) -> String {
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if self.entity(&id).is_none() {
                return id;
            }
        }
    }

    /// Remove an entity. Unknown ids are ignored.
    ///
    /// The turn index is not adjusted, so the current actor may shift.
    pub fn delete_entity(&mut self, id: &str) -> bool {
        let before = self.session.entities.len();
        self.session.entities.retain(|e| e.id != id);
        self.session.entities.len() != before
    }

    /// Merge a partial update. Unknown ids are ignored (returns false).
    pub fn update_entity(&mut self, id: &str, patch: EntityPatch) -> Result<bool, ValidationError> {
        match self.entity_mut(id) {
            Some(entity) => {
                entity.apply_patch(patch)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Heal up to max health. Returns the new health, or None for an unknown id.
    pub fn heal(&mut self, id: &str, amount: i32) -> Result<Option<i32>, ValidationError> {
        check_amount(amount)?;
        Ok(self.entity_mut(id).map(|e| e.heal(amount)))
    }

    /// Damage down to zero. Returns the new health, or None for an unknown id.
    pub fn damage(&mut self, id: &str, amount: i32) -> Result<Option<i32>, ValidationError> {
        check_amount(amount)?;
        Ok(self.entity_mut(id).map(|e| e.take_damage(amount)))
    }

    /// Flip a status tag on an entity.
    ///
    /// Returns whether the tag is applied afterwards, or None for an
    /// unknown id. Tags outside the vocabulary are rejected.
    pub fn toggle_status(&mut self, id: &str, tag: &str) -> Result<Option<bool>, ValidationError> {
        let tag: StatusTag = tag.parse()?;
        Ok(self.entity_mut(id).map(|e| e.toggle_status(tag)))
    }

    /// Grant a user player access. Returns false if nothing changed.
    pub fn add_player(&mut self, player: &str) -> Result<bool, ValidationError> {
        let player = player.trim();
        if player.is_empty() {
            return Err(ValidationError::EmptyParticipant);
        }
        if self.session.can_access(player) {
            return Ok(false);
        }
        self.session.players.push(player.to_string());
        Ok(true)
    }

    /// Revoke a user's player access. The dungeon master cannot be removed.
    pub fn remove_player(&mut self, player: &str) -> Result<bool, ValidationError> {
        let player = player.trim();
        if player.is_empty() {
            return Err(ValidationError::EmptyParticipant);
        }
        let before = self.session.players.len();
        self.session.players.retain(|p| p != player);
        Ok(self.session.players.len() != before)
    }

    /// Mark the session as written now
    pub fn touch(&mut self) {
        self.session.updated_at = now_millis();
    }

    /// Overwrite local state in full with a newer copy
    pub fn replace(&mut self, session: CombatSession) {
        self.session = session;
    }
}

fn check_amount(amount: i32) -> Result<(), ValidationError> {
    if amount <= 0 {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    Ok(())
}
