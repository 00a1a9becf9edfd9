//! Discrete suspicion stimuli reported by the embedding game
//!
//! Stimuli are queued on the `World` and consumed exactly once, at the
//! start of the next tick, so cross-entity effects stay atomic with respect
//! to tick boundaries.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A reported in-world happening entities may react to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Stimulus {
    /// A loud noise; loudness in [0, 1] scales both carry radius and the
    /// suspicion it adds
    Noise { position: Vec2, loudness: f32 },
    /// A hostile act; witnessed by entities with line of sight inside their
    /// view distance
    WitnessedAct { position: Vec2 },
}
