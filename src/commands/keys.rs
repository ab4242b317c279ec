//! Keyboard shortcuts
//!
//! | Shortcut      | Keys          |
//! |---------------|---------------|
//! | advance turn  | `n`, space    |
//! | reset combat  | `r`           |
//! | add entity    | `a`           |
//!
//! Shortcuts never fire while focus is in a text field.

use serde::{Deserialize, Serialize};

use super::Command;

/// Where keyboard focus is when a key is pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusTarget {
    /// Nothing focused, or a non-editable element
    #[default]
    Document,
    /// An `<input>` element
    TextInput,
    /// A `<textarea>` element
    TextArea,
    /// Any content-editable element
    ContentEditable,
}

impl FocusTarget {
    /// Classify an element by tag name and content-editable flag
    pub fn from_element(tag_name: &str, content_editable: bool) -> Self {
        if content_editable {
            return FocusTarget::ContentEditable;
        }
        match tag_name.to_ascii_uppercase().as_str() {
            "INPUT" => FocusTarget::TextInput,
            "TEXTAREA" => FocusTarget::TextArea,
            _ => FocusTarget::Document,
        }
    }

    /// Whether typing here should go to the field rather than shortcuts
    pub fn captures_text(&self) -> bool {
        !matches!(self, FocusTarget::Document)
    }
}

/// A key press as reported by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: String,
    #[serde(default)]
    pub focus: FocusTarget,
}

/// Primary actions bound to keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shortcut {
    AdvanceTurn,
    ResetCombat,
    OpenAddForm,
}

impl Shortcut {
    /// Session command behind this shortcut.
    ///
    /// Opening the add form is a presentation concern with no command.
    pub fn command(&self) -> Option<Command> {
        match self {
            Shortcut::AdvanceTurn => Some(Command::AdvanceTurn),
            Shortcut::ResetCombat => Some(Command::ResetCombat),
            Shortcut::OpenAddForm => None,
        }
    }
}

/// Resolve a key press to a shortcut
pub fn dispatch_key(event: &KeyEvent) -> Option<Shortcut> {
    if event.focus.captures_text() {
        return None;
    }

    match event.key.to_lowercase().as_str() {
        "n" | " " => Some(Shortcut::AdvanceTurn),
        "r" => Some(Shortcut::ResetCombat),
        "a" => Some(Shortcut::OpenAddForm),
        _ => None,
    }
}
