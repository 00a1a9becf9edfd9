//! Per-entity suspicion escalation state machine
//!
//! Suspicion accumulates from discrete events (witnessed acts, loud noises,
//! a target sprinting past) and from the continuous lurking condition, then
//! decays once a cooldown of quiet has elapsed. Reaching the ceiling fires
//! max-suspicion behavior exactly once; the latch is only released by a
//! full decay back to zero.
//!
//! The meter is pure state: bell search and suspicion contagion are driven
//! by the tick orchestration in response to the outcomes returned here.

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::types::BellId;

/// Coarse state derived from the meter's numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuspicionState {
    /// Zero suspicion, no active timers
    Idle,
    /// Nonzero suspicion, cooldown running or decaying
    Accumulating,
    /// Ceiling reached; bell-seeking or post-bell settle
    MaxSuspicion,
}

/// Why suspicion changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuspicionReason {
    WitnessedAct,
    LoudNoise,
    NearbySprinting,
    Lurking,
    /// Bumped by a nearby entity maxing out
    Contagion,
    /// A bell rang within earshot
    BellAlarm,
}

/// Result of a single mutation
#[derive(Debug, Clone, Copy, Default)]
pub struct MeterDelta {
    /// Suspicion as a fraction of the ceiling after the mutation
    pub fraction: f32,
    /// The stored value actually moved
    pub changed: bool,
    /// This mutation crossed into max (fires at most once per latch cycle)
    pub crossed_max: bool,
}

/// Result of one per-tick update
#[derive(Debug, Clone, Copy, Default)]
pub struct SuspicionTickOutcome {
    /// New fraction if the value moved this tick
    pub changed: Option<f32>,
    /// Lurking accumulation crossed into max this tick
    pub crossed_max: bool,
    /// Fully decayed to zero after having been at max
    pub cleared: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspicionMeter {
    current: f32,
    max: f32,
    /// Seconds since the last suspicious event
    time_since_event: f32,
    /// Latched on reaching max; released only by full decay to zero
    at_max: bool,
    seeking_bell: bool,
    /// Non-owning reference, resolved through the registry on every use
    bell_target: Option<BellId>,
    /// Continuous seconds the target has spent inside the lurk radius
    lurk_time: f32,

    cooldown: f32,
    decay_rate: f32,
    lurk_grace_period: f32,
    lurk_rate: f32,
}

impl SuspicionMeter {
    pub fn new(max: f32, cooldown: f32, decay_rate: f32, lurk_grace_period: f32, lurk_rate: f32) -> Self {
        Self {
            current: 0.0,
            max: max.max(f32::EPSILON),
            // Starts "already elapsed" so a fresh meter never waits to decay
            time_since_event: cooldown,
            at_max: false,
            seeking_bell: false,
            bell_target: None,
            lurk_time: 0.0,
            cooldown,
            decay_rate,
            lurk_grace_period,
            lurk_rate,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            config.max_suspicion,
            config.suspicion_cooldown,
            config.suspicion_decay_rate,
            config.lurk_grace_period,
            config.lurk_rate,
        )
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Suspicion as a fraction of the ceiling (0.0-1.0)
    pub fn fraction(&self) -> f32 {
        self.current / self.max
    }

    pub fn is_at_max(&self) -> bool {
        self.at_max
    }

    pub fn is_seeking_bell(&self) -> bool {
        self.seeking_bell
    }

    pub fn bell_target(&self) -> Option<BellId> {
        self.bell_target
    }

    pub fn state(&self) -> SuspicionState {
        if self.at_max {
            SuspicionState::MaxSuspicion
        } else if self.current > 0.0 {
            SuspicionState::Accumulating
        } else {
            SuspicionState::Idle
        }
    }

    /// Apply a discrete suspicious event
    ///
    /// Clamps into [0, max], resets the cooldown clock regardless of
    /// magnitude (a zero-amount event still restarts the quiet period), and
    /// reports whether this mutation crossed into max.
    pub fn add_suspicion(&mut self, amount: f32, reason: SuspicionReason) -> MeterDelta {
        self.time_since_event = 0.0;

        let before = self.current;
        self.current = (self.current + amount.max(0.0)).clamp(0.0, self.max);

        let changed = self.current != before;
        let crossed_max = self.current >= self.max && !self.at_max;
        if crossed_max {
            self.at_max = true;
            tracing::debug!(?reason, "suspicion reached max");
        }

        MeterDelta {
            fraction: self.fraction(),
            changed,
            crossed_max,
        }
    }

    /// Advance the meter one tick
    ///
    /// `lurking` is whether the target is currently inside this entity's
    /// lurk radius; accumulation only starts after the grace period of
    /// continuous presence and is suppressed by the disguise modifier while
    /// the target is disguised.
    pub fn update(&mut self, dt: f32, lurking: bool, disguise_modifier: Option<f32>) -> SuspicionTickOutcome {
        let mut outcome = SuspicionTickOutcome::default();

        if lurking {
            self.lurk_time += dt;
            if self.lurk_time >= self.lurk_grace_period {
                let rate = self.lurk_rate * disguise_modifier.unwrap_or(1.0);
                let delta = self.add_suspicion(rate * dt, SuspicionReason::Lurking);
                if delta.changed {
                    outcome.changed = Some(delta.fraction);
                }
                outcome.crossed_max = delta.crossed_max;
            }
        } else {
            self.lurk_time = 0.0;
        }

        self.time_since_event += dt;

        // Decay only once the quiet period has fully elapsed
        if self.current > 0.0 && self.time_since_event >= self.cooldown {
            let before = self.current;
            self.current = (self.current - self.decay_rate * dt).max(0.0);
            if self.current != before {
                outcome.changed = Some(self.fraction());
            }
            if self.current == 0.0 {
                if self.at_max {
                    outcome.cleared = true;
                }
                self.at_max = false;
            }
        }

        outcome
    }

    /// Enter bell-seeking toward the given bell
    pub fn begin_bell_seek(&mut self, bell: BellId) {
        self.seeking_bell = true;
        self.bell_target = Some(bell);
    }

    /// Give up on the current bell (missing or sabotaged on arrival)
    pub fn abandon_bell_seek(&mut self) {
        self.seeking_bell = false;
        self.bell_target = None;
    }

    /// Partial reset after successfully ringing a bell
    ///
    /// Settles to half the ceiling rather than zero: the entity stays on
    /// edge after raising an alarm. The max latch stays set, so suspicion
    /// climbing back up will not re-fire max behavior until a full
    /// decay-to-zero cycle has happened.
    pub fn settle_after_ringing(&mut self) {
        self.seeking_bell = false;
        self.bell_target = None;
        self.current = self.max * 0.5;
        self.time_since_event = 0.0;
    }

    /// Hard reset to a calm entity
    pub fn reset(&mut self) {
        self.current = 0.0;
        self.time_since_event = self.cooldown;
        self.at_max = false;
        self.seeking_bell = false;
        self.bell_target = None;
        self.lurk_time = 0.0;
    }
}
