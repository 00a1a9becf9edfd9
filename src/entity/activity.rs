//! What an entity is currently doing, polled by the tick loop

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Current activity of a guard or citizen
///
/// Movement itself belongs to the navigation service; the activity records
/// why the entity is moving so arrival can be polled and resolved on later
/// ticks.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Activity {
    #[default]
    Idle,
    /// Heading to inspect a position (noise, last-known sighting)
    Investigating { position: Vec2 },
    /// Heading for the bell held in the suspicion meter's bell target
    SeekingBell,
    /// Running away from a position
    Fleeing { from: Vec2 },
}

impl Activity {
    pub fn is_idle(&self) -> bool {
        matches!(self, Activity::Idle)
    }
}
