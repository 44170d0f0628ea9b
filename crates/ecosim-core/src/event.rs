//! Activation, cooldown and duration bookkeeping shared by outbreaks and
//! weather.
//!
//! A cycle is `Idle` until its controller decides to trigger it, then `Active`
//! for a rolled number of ticks, then `Idle` again with the deactivation tick
//! recorded so the cooldown can be enforced. Every transition is a function of
//! the tick, the timing parameters and an explicit RNG.

use crate::config::SimConfigError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Timing parameters of a recurring event.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventTiming {
    /// Chance per eligible tick that the event triggers.
    pub probability: f64,
    /// Minimum ticks between a deactivation and the next trigger.
    pub cooldown: u64,
    /// Upper bound of the random part of the duration roll.
    pub max_length: u32,
}

impl EventTiming {
    pub fn validate(&self, name: &str) -> Result<(), SimConfigError> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(SimConfigError::InvalidEventProbability {
                name: name.to_string(),
                value: self.probability,
            });
        }
        if self.max_length == 0 {
            return Err(SimConfigError::InvalidEventLength {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Duration in `[min_duration, min_duration + max_length - 1]`.
    pub fn roll_duration<R: Rng + ?Sized>(&self, rng: &mut R, min_duration: u32) -> u32 {
        rng.random_range(0..self.max_length) + min_duration
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EventState {
    Idle { last_deactivated: u64 },
    Active { remaining: u32, since: u64 },
}

impl Default for EventState {
    fn default() -> Self {
        EventState::Idle { last_deactivated: 0 }
    }
}

/// Result of advancing an active cycle by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Countdown {
    Running { remaining: u32 },
    Ended,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventCycle {
    state: EventState,
}

impl EventCycle {
    pub fn state(&self) -> EventState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, EventState::Active { .. })
    }

    /// True once `tick > last_deactivated + cooldown - 1`.
    pub fn cooled_down(&self, tick: u64, timing: &EventTiming) -> bool {
        match self.state {
            EventState::Idle { last_deactivated } => tick + 1 > last_deactivated + timing.cooldown,
            EventState::Active { .. } => false,
        }
    }

    /// Cooldown check followed by the probability roll. The roll is only
    /// drawn when the cooldown has elapsed.
    pub fn should_trigger<R: Rng + ?Sized>(
        &self,
        tick: u64,
        timing: &EventTiming,
        rng: &mut R,
    ) -> bool {
        self.cooled_down(tick, timing) && rng.random::<f64>() <= timing.probability
    }

    pub fn activate(&mut self, tick: u64, duration: u32) {
        debug_assert!(duration > 0, "an active event needs at least one tick");
        self.state = EventState::Active {
            remaining: duration,
            since: tick,
        };
    }

    /// Decrement the remaining duration once. Reaching zero returns the cycle
    /// to `Idle` with `tick` recorded as the deactivation tick.
    pub fn count_down(&mut self, tick: u64) -> Countdown {
        match self.state {
            EventState::Active { remaining, since } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.state = EventState::Idle {
                        last_deactivated: tick,
                    };
                    Countdown::Ended
                } else {
                    self.state = EventState::Active { remaining, since };
                    Countdown::Running { remaining }
                }
            }
            EventState::Idle { .. } => Countdown::Ended,
        }
    }
}
