use super::metrics::StepStatus;
use super::World;
use crate::behavior::{self, TickContext};
use crate::config::SeedingConfig;
use crate::disease::Outbreaks;
use crate::grid::Location;
use crate::weather::Forecast;
use rand::Rng;
use tracing::{debug, trace};

impl World {
    /// Seed every cell independently: kinds are tried in priority order and
    /// the first successful roll claims the cell.
    pub(crate) fn populate(&mut self) {
        let cells: Vec<Location> = self.population.grid().locations().collect();
        for loc in cells {
            let seeding = &self.config.seeding;
            let rng = &mut self.rng;
            let Some(kind) = SeedingConfig::PRIORITY
                .into_iter()
                .find(|&kind| rng.random_bool(seeding.probability(kind)))
            else {
                continue;
            };
            if let Some(id) = self.population.spawn_seeded(kind, loc, &mut self.rng) {
                self.live.push(id);
            }
        }
        debug!(seeded = self.live.len(), "population seeded");
    }

    /// Clear the grid and every event, then seed a fresh population. The RNG
    /// stream carries on, so consecutive resets differ.
    pub fn reset(&mut self) -> StepStatus {
        self.tick = 0;
        self.is_day = true;
        self.population.clear();
        self.live.clear();
        self.outbreaks = Outbreaks::new(&self.config.diseases);
        self.forecast = Forecast::new(&self.config.weathers);
        self.births_last_step = 0;
        self.deaths_last_step = 0;
        self.total_births = 0;
        self.total_deaths = 0;
        self.populate();
        self.status()
    }

    /// Advance one tick.
    ///
    /// Events move first, then every entity alive at the start of the pass
    /// acts once in stable order. Entities killed earlier in the pass are
    /// skipped; newborns join the order after the pass.
    pub fn step(&mut self) -> StepStatus {
        self.tick += 1;
        let tick = self.tick;
        if tick % self.config.day_length == 0 {
            self.is_day = !self.is_day;
        }

        if let Some(change) = self
            .outbreaks
            .advance(tick, &mut self.population, &mut self.rng)
        {
            trace!(tick, ?change, "outbreak changed");
        }
        if let Some(change) = self.forecast.advance(tick, &mut self.rng) {
            trace!(tick, ?change, "weather changed");
        }

        let ctx = TickContext {
            is_day: self.is_day,
            disease: self.outbreaks.active(),
            weather: self.forecast.active(),
        };
        let mut newborns = Vec::new();
        for &id in &self.live {
            if !self.population.is_alive(id) {
                continue;
            }
            let outcome = behavior::act(&mut self.population, id, &ctx, &mut self.rng);
            newborns.extend(outcome.spawned);
        }

        let before = self.live.len();
        let population = &mut self.population;
        self.live.retain(|&id| {
            let alive = population.is_alive(id);
            if !alive {
                population.release(id);
            }
            alive
        });
        let mut deaths = before - self.live.len();
        let births = newborns.len();
        for id in newborns {
            if self.population.is_alive(id) {
                self.live.push(id);
            } else {
                // Eaten or killed by a later actor in the same pass.
                self.population.release(id);
                deaths += 1;
            }
        }

        self.births_last_step = births;
        self.deaths_last_step = deaths;
        self.total_births += births;
        self.total_deaths += deaths;
        trace!(tick, births, deaths, live = self.live.len(), "step");
        self.status()
    }
}
