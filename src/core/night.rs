//! Night clock - phases of the night and ambient light
//!
//! The simulation runs across a single night at a time. The clock advances
//! with the tick loop and supplies the ambient light level consumed by the
//! detection timers; darker phases make detection slower.

use serde::{Deserialize, Serialize};

/// Phase of the night, derived from normalized night progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NightPhase {
    /// 0%-10% - Sun just set, streets still half-lit
    Dusk,
    /// 10%-30% - Lamps and windows, fading traffic
    Evening,
    /// 30%-60% - Deepest darkness
    Midnight,
    /// 60%-85% - Still dark, first stirrings
    LateNight,
    /// 85%-95% - Sky begins to lighten
    PreDawn,
    /// 95%-100% - Sun rises, night ends
    Dawn,
}

impl NightPhase {
    /// Get night phase from normalized progress (0.0-1.0)
    pub fn from_progress(progress: f32) -> Self {
        let p = progress.clamp(0.0, 1.0);
        if p < 0.1 {
            NightPhase::Dusk
        } else if p < 0.3 {
            NightPhase::Evening
        } else if p < 0.6 {
            NightPhase::Midnight
        } else if p < 0.85 {
            NightPhase::LateNight
        } else if p < 0.95 {
            NightPhase::PreDawn
        } else {
            NightPhase::Dawn
        }
    }

    /// Ambient light level for this phase (0.0-1.0)
    pub fn ambient_light(&self) -> f32 {
        match self {
            NightPhase::Dusk => 0.35,
            NightPhase::Evening => 0.2,
            NightPhase::Midnight => 0.05,
            NightPhase::LateNight => 0.1,
            NightPhase::PreDawn => 0.25,
            NightPhase::Dawn => 0.5,
        }
    }
}

/// Per-night clock advanced by the tick loop
///
/// Dawn is latched, not rolled over: the clock reports that the night has
/// ended and stays there until `begin_new_night` starts the next one. The
/// new-night reset itself is an external trigger on the `World`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NightClock {
    /// Seconds elapsed in the current night
    elapsed: f32,
    /// Length of one night in seconds
    night_length: f32,
    /// Nights completed so far
    pub nights_elapsed: u32,
    dawn_reached: bool,
}

impl NightClock {
    pub fn new(night_length: f32) -> Self {
        Self {
            elapsed: 0.0,
            night_length: night_length.max(1.0),
            nights_elapsed: 0,
            dawn_reached: false,
        }
    }

    /// Advance the clock; returns true on the tick the night ends
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.dawn_reached {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed >= self.night_length {
            self.dawn_reached = true;
            return true;
        }
        false
    }

    /// Normalized progress through the night (0.0-1.0)
    pub fn progress(&self) -> f32 {
        (self.elapsed / self.night_length).clamp(0.0, 1.0)
    }

    pub fn phase(&self) -> NightPhase {
        NightPhase::from_progress(self.progress())
    }

    /// Ambient light at the current moment
    pub fn ambient_light(&self) -> f32 {
        self.phase().ambient_light()
    }

    /// Seconds elapsed in the current night
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_dawn(&self) -> bool {
        self.dawn_reached
    }

    /// Start the next night from dusk
    pub fn begin_new_night(&mut self) {
        if self.dawn_reached {
            self.nights_elapsed += 1;
        }
        self.elapsed = 0.0;
        self.dawn_reached = false;
    }
}
