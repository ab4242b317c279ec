//! Turn order
//!
//! The turn-ordered view is recomputed from the roster on every read and
//! never stored. Highest initiative acts first; ties keep roster order.

use super::entity::Entity;

/// Sort the roster by initiative, descending.
///
/// The sort is stable, so entities with equal initiative keep the order
/// in which they joined the roster.
pub fn turn_order(roster: &[Entity]) -> Vec<&Entity> {
    let mut view: Vec<&Entity> = roster.iter().collect();
    view.sort_by(|a, b| b.initiative.cmp(&a.initiative));
    view
}

/// Entity whose turn it is at a positional index into the view
pub fn current_actor<'a>(view: &[&'a Entity], index: usize) -> Option<&'a Entity> {
    view.get(index).copied()
}
