//! External collaborator boundaries: geometry and navigation

pub mod geometry;
pub mod nav;

pub use geometry::{GeometryOracle, ObstacleMask, OpenGround, WallMap};
pub use nav::{DirectNavigator, Navigator};
