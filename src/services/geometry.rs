//! Geometry oracle - line-of-sight and angle queries
//!
//! The AI core never owns level geometry. Whatever physics or navmesh layer
//! the game runs is wrapped behind [`GeometryOracle`]; the crate ships two
//! implementations, an unobstructed ground plane and a 2D wall map, which
//! are enough for tests and the demo binary.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Bitmask selecting which obstacle layers block a ray
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleMask(pub u32);

impl ObstacleMask {
    /// Layers that block sight lines (walls, buildings)
    pub const VISION: ObstacleMask = ObstacleMask(0x1);
    /// Every layer
    pub const ALL: ObstacleMask = ObstacleMask(u32::MAX);

    pub fn intersects(&self, other: ObstacleMask) -> bool {
        self.0 & other.0 != 0
    }
}

/// Distance, angle, and obstruction queries against level geometry
///
/// `Sync` so the read-only detection pass can fan out across threads.
pub trait GeometryOracle: Sync {
    /// Whether anything in `mask` blocks the segment from `from` to `to`
    fn raycast_blocked(&self, from: Vec2, to: Vec2, mask: ObstacleMask) -> bool;

    fn distance(&self, a: Vec2, b: Vec2) -> f32 {
        a.distance(b)
    }

    /// Unsigned angle between two directions in radians (0..=PI)
    fn angle_between(&self, a: Vec2, b: Vec2) -> f32 {
        let a = a.normalize_or_zero();
        let b = b.normalize_or_zero();
        if a == Vec2::ZERO || b == Vec2::ZERO {
            return 0.0;
        }
        a.angle_between(b).abs()
    }
}

/// Oracle for an empty plane: nothing ever blocks a ray
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGround;

impl GeometryOracle for OpenGround {
    fn raycast_blocked(&self, _from: Vec2, _to: Vec2, _mask: ObstacleMask) -> bool {
        false
    }
}

/// A wall segment with the layers it occupies
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Wall {
    pub a: Vec2,
    pub b: Vec2,
    pub mask: ObstacleMask,
}

/// Oracle backed by a flat list of 2D wall segments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WallMap {
    walls: Vec<Wall>,
}

impl WallMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_wall(&mut self, a: Vec2, b: Vec2) {
        self.walls.push(Wall {
            a,
            b,
            mask: ObstacleMask::VISION,
        });
    }

    pub fn add_wall_with_mask(&mut self, a: Vec2, b: Vec2, mask: ObstacleMask) {
        self.walls.push(Wall { a, b, mask });
    }

    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }
}

impl GeometryOracle for WallMap {
    fn raycast_blocked(&self, from: Vec2, to: Vec2, mask: ObstacleMask) -> bool {
        self.walls
            .iter()
            .filter(|w| w.mask.intersects(mask))
            .any(|w| segments_intersect(from, to, w.a, w.b))
    }
}

/// Proper segment-segment intersection via signed areas
///
/// Collinear overlaps count as intersecting; touching at a single shared
/// endpoint does too, which errs toward "blocked" for grazing rays.
fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let d1 = (q2 - q1).perp_dot(p1 - q1);
    let d2 = (q2 - q1).perp_dot(p2 - q1);
    let d3 = (p2 - p1).perp_dot(q1 - p1);
    let d4 = (p2 - p1).perp_dot(q2 - p1);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}
