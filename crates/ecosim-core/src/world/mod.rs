pub mod lifecycle;
pub mod metrics;
#[cfg(test)]
mod tests;

pub use metrics::*;

use crate::config::{SimConfig, SimConfigError};
use crate::disease::Outbreaks;
use crate::entity::{Entity, EntityId, Sex};
use crate::grid::{Grid, Location};
use crate::kind::Kind;
use crate::population::Population;
use crate::weather::Forecast;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::{error::Error, fmt};

/// The tick scheduler and everything it owns.
pub struct World {
    pub(crate) config: SimConfig,
    pub(crate) population: Population,
    pub(crate) outbreaks: Outbreaks,
    pub(crate) forecast: Forecast,
    pub(crate) rng: ChaCha12Rng,
    pub(crate) tick: u64,
    pub(crate) is_day: bool,
    /// Live entities in action order. Newborns are appended after each pass.
    pub(crate) live: Vec<EntityId>,
    pub(crate) births_last_step: usize,
    pub(crate) deaths_last_step: usize,
    pub(crate) total_births: usize,
    pub(crate) total_deaths: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorldInitError {
    Config(SimConfigError),
    TooManyCells { max: usize, actual: usize },
}

impl fmt::Display for WorldInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldInitError::Config(e) => write!(f, "{}", e),
            WorldInitError::TooManyCells { max, actual } => {
                write!(f, "grid cell count ({actual}) exceeds supported maximum ({max})")
            }
        }
    }
}

impl From<SimConfigError> for WorldInitError {
    fn from(err: SimConfigError) -> Self {
        WorldInitError::Config(err)
    }
}

impl Error for WorldInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorldInitError::Config(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExperimentError {
    InvalidSampleEvery,
    TooManySteps { max: usize, actual: usize },
}

impl fmt::Display for ExperimentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperimentError::InvalidSampleEvery => write!(f, "sample_every must be positive"),
            ExperimentError::TooManySteps { max, actual } => {
                write!(f, "steps ({actual}) exceed supported maximum ({max})")
            }
        }
    }
}

impl Error for ExperimentError {}

impl World {
    /// Entity ids are `u32` and a tick can briefly hold a dead entity and a
    /// newborn per cell, so the grid is kept well below that range.
    pub const MAX_CELLS: usize = 1 << 24;

    pub const MAX_EXPERIMENT_STEPS: usize = 1_000_000;

    pub fn new(config: SimConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Validate `config`, build the grid and seed the initial population.
    pub fn try_new(config: SimConfig) -> Result<Self, WorldInitError> {
        config.validate()?;
        let (depth, width) = config.grid_dimensions();
        let cells = depth.saturating_mul(width);
        if cells > Self::MAX_CELLS {
            return Err(WorldInitError::TooManyCells {
                max: Self::MAX_CELLS,
                actual: cells,
            });
        }

        let mut world = Self {
            population: Population::new(depth, width, config.kinds.clone()),
            outbreaks: Outbreaks::try_new(&config.diseases)?,
            forecast: Forecast::new(&config.weathers),
            rng: ChaCha12Rng::seed_from_u64(config.seed),
            tick: 0,
            is_day: true,
            live: Vec::new(),
            births_last_step: 0,
            deaths_last_step: 0,
            total_births: 0,
            total_deaths: 0,
            config,
        };
        world.populate();
        Ok(world)
    }

    /// Default tuning on a `depth` x `width` grid. Non-positive dimensions
    /// fall back to the default grid size.
    pub fn initialize(depth: i64, width: i64, seed: u64) -> Self {
        Self::new(SimConfig::with_dimensions(depth, width, seed))
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        self.population.grid()
    }

    pub fn location(&self, row: usize, col: usize) -> Option<Location> {
        self.grid().location(row, col)
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn is_day(&self) -> bool {
        self.is_day
    }

    /// Live entity behind `id`.
    ///
    /// Slots of dead entities are released at the end of each step and
    /// reused by later spawns, so an id held across a step may name a
    /// different entity. Re-read ids from [`World::cells`] or
    /// [`World::spawn_at`] rather than caching them across steps.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.population.get(id).filter(|e| e.is_alive())
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn total_births(&self) -> usize {
        self.total_births
    }

    pub fn total_deaths(&self) -> usize {
        self.total_deaths
    }

    pub fn outbreaks(&self) -> &Outbreaks {
        &self.outbreaks
    }

    pub fn forecast(&self) -> &Forecast {
        &self.forecast
    }

    pub fn status(&self) -> StepStatus {
        StepStatus {
            tick: self.tick,
            is_day: self.is_day,
            disease: self.outbreaks.active().map(|d| d.name().to_string()),
            weather: self.forecast.active().map(|w| w.name().to_string()),
        }
    }

    /// Every occupied cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellView> + '_ {
        self.population.grid().occupied().filter_map(|(location, id)| {
            self.population.get(id).map(|entity| CellView {
                location,
                kind: entity.kind(),
                infected: entity.is_infected(),
            })
        })
    }

    /// Place a hand-built entity. It joins the end of the action order.
    pub fn spawn_at(
        &mut self,
        kind: Kind,
        loc: Location,
        age: u32,
        energy: i32,
        sex: Sex,
    ) -> Option<EntityId> {
        let id = self.population.spawn(kind, loc, age, energy, sex)?;
        self.live.push(id);
        Some(id)
    }

    /// Step `steps` times, sampling metrics every `sample_every` ticks and on
    /// the final one.
    pub fn try_run(
        &mut self,
        steps: usize,
        sample_every: usize,
    ) -> Result<RunSummary, ExperimentError> {
        if sample_every == 0 {
            return Err(ExperimentError::InvalidSampleEvery);
        }
        if steps > Self::MAX_EXPERIMENT_STEPS {
            return Err(ExperimentError::TooManySteps {
                max: Self::MAX_EXPERIMENT_STEPS,
                actual: steps,
            });
        }

        let births_before = self.total_births;
        let deaths_before = self.total_deaths;
        let estimated_samples = if steps == 0 {
            0
        } else {
            ((steps - 1) / sample_every) + 1
        };
        let mut samples = Vec::with_capacity(estimated_samples);
        for step in 1..=steps {
            self.step();
            if step % sample_every == 0 || step == steps {
                samples.push(self.step_metrics());
            }
        }
        Ok(RunSummary {
            schema_version: 1,
            steps,
            sample_every,
            samples,
            total_births: self.total_births - births_before,
            total_deaths: self.total_deaths - deaths_before,
            final_population: self.population(),
        })
    }
}
