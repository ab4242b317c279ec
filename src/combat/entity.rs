//! Combatant model
//!
//! Defines a single tracked combatant:
//! - Health and max health
//! - Initiative
//! - Status tags from a fixed vocabulary

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::ValidationError;

/// Default health and max health for a new entity
pub const DEFAULT_HEALTH: i32 = 10;

/// Default initiative for a new entity
pub const DEFAULT_INITIATIVE: i32 = 10;

/// Status conditions that can be applied to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusTag {
    Poisoned,
    Stunned,
    Blessed,
    Cursed,
    Burning,
    Frozen,
    Paralyzed,
    Invisible,
    Hasted,
    Slowed,
}

impl StatusTag {
    /// Every tag in the vocabulary, in display order
    pub const ALL: [StatusTag; 10] = [
        StatusTag::Poisoned,
        StatusTag::Stunned,
        StatusTag::Blessed,
        StatusTag::Cursed,
        StatusTag::Burning,
        StatusTag::Frozen,
        StatusTag::Paralyzed,
        StatusTag::Invisible,
        StatusTag::Hasted,
        StatusTag::Slowed,
    ];

    /// Canonical name of the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTag::Poisoned => "Poisoned",
            StatusTag::Stunned => "Stunned",
            StatusTag::Blessed => "Blessed",
            StatusTag::Cursed => "Cursed",
            StatusTag::Burning => "Burning",
            StatusTag::Frozen => "Frozen",
            StatusTag::Paralyzed => "Paralyzed",
            StatusTag::Invisible => "Invisible",
            StatusTag::Hasted => "Hasted",
            StatusTag::Slowed => "Slowed",
        }
    }
}

impl FromStr for StatusTag {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        StatusTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

impl std::fmt::Display for StatusTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a list of tag names, dropping duplicates but keeping first-seen order
pub fn parse_statuses<S: AsRef<str>>(names: &[S]) -> Result<Vec<StatusTag>, ValidationError> {
    let mut tags = Vec::with_capacity(names.len());
    for name in names {
        let tag: StatusTag = name.as_ref().parse()?;
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    Ok(tags)
}

/// A tracked combatant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Unique within the session, never reassigned
    pub id: String,
    pub name: String,
    /// Current hit points
    pub health: i32,
    /// Maximum hit points (always >= 1)
    pub max_health: i32,
    /// Higher acts first; may be negative
    pub initiative: i32,
    /// Active status tags, each at most once, in the order applied
    #[serde(default)]
    pub statuses: Vec<StatusTag>,
}

impl Entity {
    /// An entity at zero health is dead but stays in the roster
    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Check whether a status tag is applied
    pub fn has_status(&self, tag: StatusTag) -> bool {
        self.statuses.contains(&tag)
    }

    /// Heal, never exceeding max health. Returns the new health.
    pub fn heal(&mut self, amount: i32) -> i32 {
        self.health = self.health.saturating_add(amount).min(self.max_health);
        self.health
    }

    /// Take damage, never dropping below zero. Returns the new health.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        self.health = self.health.saturating_sub(amount).max(0);
        self.health
    }

    /// Add the tag if absent, remove it if present.
    /// Returns true when the tag is applied afterwards.
    pub fn toggle_status(&mut self, tag: StatusTag) -> bool {
        if let Some(pos) = self.statuses.iter().position(|t| *t == tag) {
            self.statuses.remove(pos);
            false
        } else {
            self.statuses.push(tag);
            true
        }
    }

    /// Merge a partial update into this entity.
    ///
    /// Health is applied as given, so an editor may pass through
    /// out-of-range values; only the max health floor is enforced.
    pub fn apply_patch(&mut self, patch: EntityPatch) -> Result<(), ValidationError> {
        // Validate before touching any field so a bad patch leaves us unchanged
        let statuses = match patch.statuses {
            Some(ref names) => Some(parse_statuses(names)?),
            None => None,
        };

        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(health) = patch.health {
            self.health = health;
        }
        if let Some(max_health) = patch.max_health {
            self.max_health = max_health.max(1);
        }
        if let Some(initiative) = patch.initiative {
            self.initiative = initiative;
        }
        if let Some(statuses) = statuses {
            self.statuses = statuses;
        }
        Ok(())
    }
}

/// Caller-supplied attributes for a new entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityDraft {
    pub name: String,
    pub health: i32,
    pub max_health: i32,
    pub initiative: i32,
    pub statuses: Vec<String>,
}

impl Default for EntityDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            health: DEFAULT_HEALTH,
            max_health: DEFAULT_HEALTH,
            initiative: DEFAULT_INITIATIVE,
            statuses: Vec::new(),
        }
    }
}

impl EntityDraft {
    /// Create a draft with default stats
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set current and max health
    pub fn with_health(mut self, health: i32, max_health: i32) -> Self {
        self.health = health;
        self.max_health = max_health;
        self
    }

    /// Set initiative
    pub fn with_initiative(mut self, initiative: i32) -> Self {
        self.initiative = initiative;
        self
    }

    /// Add a status tag by name
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.statuses.push(status.into());
        self
    }

    /// Validate the draft and build an entity with the given id.
    ///
    /// Max health below 1 is raised to 1 and health is clamped into
    /// `[0, max_health]`.
    pub fn into_entity(self, id: String) -> Result<Entity, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let statuses = parse_statuses(&self.statuses)?;
        let max_health = self.max_health.max(1);

        Ok(Entity {
            id,
            name: self.name,
            health: self.health.clamp(0, max_health),
            max_health,
            initiative: self.initiative,
            statuses,
        })
    }
}

/// Partial update for an existing entity; `None` fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_health: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiative: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<String>>,
}
