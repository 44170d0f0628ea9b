use crate::config::SimConfigError;
use crate::entity::EntityId;
use crate::event::{Countdown, EventCycle, EventState, EventTiming};
use crate::kind::{Kind, KindSet};
use crate::population::Population;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Every weather spell lasts at least this many ticks.
pub const MIN_WEATHER_TICKS: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "delta", rename_all = "snake_case")]
pub enum WeatherEffect {
    /// Top the entity up to its kind's maximum energy.
    RestoreEnergy,
    /// Apply a fixed energy delta.
    EnergyDelta(i32),
}

impl WeatherEffect {
    /// Restorative weather spares plants their background attrition.
    pub fn is_restorative(self) -> bool {
        matches!(self, WeatherEffect::RestoreEnergy)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub name: String,
    pub affects: KindSet,
    pub effect: WeatherEffect,
    #[serde(flatten)]
    pub timing: EventTiming,
}

impl WeatherConfig {
    pub fn rain() -> Self {
        Self {
            name: "Raining".to_string(),
            affects: KindSet::of(&[Kind::Grass]),
            effect: WeatherEffect::RestoreEnergy,
            timing: EventTiming {
                probability: 0.8,
                cooldown: 5,
                max_length: 30,
            },
        }
    }

    pub fn validate(&self) -> Result<(), SimConfigError> {
        self.timing.validate(&self.name)
    }
}

#[derive(Clone, Debug)]
pub struct Weather {
    config: WeatherConfig,
    cycle: EventCycle,
}

impl Weather {
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }

    pub fn state(&self) -> EventState {
        self.cycle.state()
    }

    pub fn is_restorative(&self) -> bool {
        self.config.effect.is_restorative()
    }

    pub fn affects(&self, kind: Kind) -> bool {
        self.config.affects.contains(kind)
    }

    /// Apply this weather's effect to `id` if its kind is affected.
    pub fn apply(&self, pop: &mut Population, id: EntityId) {
        let Some(kind) = pop.get(id).filter(|e| e.is_alive()).map(|e| e.kind()) else {
            return;
        };
        if !self.affects(kind) {
            return;
        }
        let delta = match self.config.effect {
            WeatherEffect::RestoreEnergy => pop.config(kind).max_energy,
            WeatherEffect::EnergyDelta(delta) => delta,
        };
        pop.change_energy(id, delta);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WeatherChange {
    Started { name: String, duration: u32 },
    Ended { name: String },
}

/// Pool of registered weather with at most one active spell at a time.
///
/// Unlike outbreaks nothing is seeded on activation: the active weather is
/// applied by every affected entity during its own action.
#[derive(Clone, Debug, Default)]
pub struct Forecast {
    pool: Vec<Weather>,
    active: Option<usize>,
}

impl Forecast {
    pub fn new(configs: &[WeatherConfig]) -> Self {
        Self {
            pool: configs
                .iter()
                .map(|config| Weather {
                    config: config.clone(),
                    cycle: EventCycle::default(),
                })
                .collect(),
            active: None,
        }
    }

    pub fn pool(&self) -> &[Weather] {
        &self.pool
    }

    pub fn active(&self) -> Option<&Weather> {
        self.active.map(|idx| &self.pool[idx])
    }

    pub fn advance<R: Rng + ?Sized>(&mut self, tick: u64, rng: &mut R) -> Option<WeatherChange> {
        match self.active {
            None => {
                if self.pool.is_empty() {
                    return None;
                }
                let idx = rng.random_range(0..self.pool.len());
                let weather = &mut self.pool[idx];
                let timing = weather.config.timing;
                if !weather.cycle.should_trigger(tick, &timing, rng) {
                    return None;
                }
                let duration = timing.roll_duration(rng, MIN_WEATHER_TICKS);
                weather.cycle.activate(tick, duration);
                debug!(weather = %weather.config.name, tick, duration, "weather started");
                let name = weather.config.name.clone();
                self.active = Some(idx);
                Some(WeatherChange::Started { name, duration })
            }
            Some(idx) => {
                let weather = &mut self.pool[idx];
                match weather.cycle.count_down(tick) {
                    Countdown::Running { .. } => None,
                    Countdown::Ended => {
                        debug!(weather = %weather.config.name, tick, "weather cleared");
                        let name = weather.config.name.clone();
                        self.active = None;
                        Some(WeatherChange::Ended { name })
                    }
                }
            }
        }
    }
}
