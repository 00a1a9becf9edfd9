//! Core type definitions used throughout the codebase

use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// Unique identifier for alarm bells
///
/// Bells are referenced by id and resolved through the registry on every
/// use, so a bell removed mid-night is observed as "not found" rather than
/// a dangling reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BellId(pub u32);

impl BellId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Entity kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpcKind {
    Guard,
    Citizen,
}

/// Position plus forward-facing direction of an observer
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec2,
    /// Unit-length facing; callers normalize on write
    pub facing: Vec2,
}

impl Pose {
    pub fn new(position: Vec2, facing: Vec2) -> Self {
        Self {
            position,
            facing: facing.normalize_or_zero(),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            facing: Vec2::X,
        }
    }
}

/// Externally-updated state of the hunted intruder
///
/// The movement/input layer owns this; the AI core only reads it. A world
/// without a target is a normal condition and every system degrades to a
/// no-op in that case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TargetState {
    pub position: Vec2,
    pub velocity: Vec2,
    /// While disguised, lurk-based suspicion accumulates slower
    pub disguised: bool,
}

impl TargetState {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            disguised: false,
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}
