pub mod events;
pub mod stimulus;
pub mod tick;

pub use events::{AiEvent, MovePurpose};
pub use stimulus::Stimulus;
pub use tick::run_simulation_tick;
