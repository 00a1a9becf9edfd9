//! Events generated during simulation ticks
//!
//! These are the outward surface of the AI core: one `Vec<AiEvent>` is
//! returned per tick for the embedding game (and the demo binary's log) to
//! consume. Nothing in the core reacts to its own events after the tick.

use glam::Vec2;
use serde::Serialize;

use crate::alert::AlertLevel;
use crate::core::types::{BellId, EntityId};
use crate::entity::suspicion::SuspicionReason;

/// Why a movement directive was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MovePurpose {
    SeekBell,
    Investigate,
    Flee,
    ReturnToPost,
}

/// Events returned by `run_simulation_tick`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AiEvent {
    /// An observer accumulated detection this tick
    DetectionProgress { entity: EntityId, progress: f32 },
    /// Detection completed; position is the sighting recorded as last-known
    TargetAcquired { entity: EntityId, position: Vec2 },
    /// Visibility failed after accumulating
    TargetLost { entity: EntityId },
    /// A meter moved; fraction is of the suspicion ceiling
    SuspicionChanged {
        entity: EntityId,
        fraction: f32,
        reason: SuspicionReason,
    },
    MaxSuspicionReached { entity: EntityId },
    /// Fully decayed to zero after having been at max
    SuspicionCleared { entity: EntityId },
    /// Outward movement directive issued to the navigation service
    MoveRequested {
        entity: EntityId,
        goal: Vec2,
        purpose: MovePurpose,
    },
    BellRung {
        bell: BellId,
        toll_count: u32,
        by: Option<EntityId>,
    },
    AlertLevelChanged { from: AlertLevel, to: AlertLevel },
    /// Citizen reaction to a bell at high alert
    CitizenFleeing { entity: EntityId, from: Vec2 },
    /// Guard reaction to a bell or noise
    GuardInvestigating { entity: EntityId, position: Vec2 },
    /// The night ended; `begin_new_night` is the external reset trigger
    DawnBroke { nights_elapsed: u32 },
}
