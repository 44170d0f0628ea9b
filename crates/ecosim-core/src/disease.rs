use crate::config::{SimConfig, SimConfigError};
use crate::entity::EntityId;
use crate::event::{Countdown, EventCycle, EventState, EventTiming};
use crate::kind::{Kind, KindSet};
use crate::population::Population;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Every outbreak lasts at least this many ticks.
pub const MIN_OUTBREAK_TICKS: u32 = 10;

/// Index of a disease in the registered pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiseaseId(pub u8);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiseaseConfig {
    pub name: String,
    pub affects: KindSet,
    /// Energy delta applied on infection and on every spread to a neighbor.
    pub damage_points: i32,
    #[serde(flatten)]
    pub timing: EventTiming,
}

impl DiseaseConfig {
    pub fn ebola() -> Self {
        Self {
            name: "Ebola".to_string(),
            affects: KindSet::of(&[Kind::Human, Kind::Zombie]),
            damage_points: -10,
            timing: EventTiming {
                probability: 0.8,
                cooldown: 10,
                max_length: 20,
            },
        }
    }

    pub fn validate(&self) -> Result<(), SimConfigError> {
        self.timing.validate(&self.name)
    }
}

#[derive(Clone, Debug)]
pub struct Disease {
    id: DiseaseId,
    config: DiseaseConfig,
    cycle: EventCycle,
}

impl Disease {
    pub fn id(&self) -> DiseaseId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &DiseaseConfig {
        &self.config
    }

    pub fn state(&self) -> EventState {
        self.cycle.state()
    }

    pub fn affects(&self, kind: Kind) -> bool {
        self.config.affects.contains(kind)
    }

    /// Damage every occupant adjacent to `carrier`, whatever its kind.
    pub fn spread<R: Rng + ?Sized>(&self, pop: &mut Population, carrier: EntityId, rng: &mut R) {
        let Some(loc) = pop.get(carrier).and_then(|e| e.location()) else {
            return;
        };
        for where_ in pop.grid().neighbors(loc, 1, rng) {
            if let Some(victim) = pop.grid().at(where_) {
                pop.change_energy(victim, self.config.damage_points);
            }
        }
    }
}

/// What an [`Outbreaks::advance`] call changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutbreakChange {
    Started {
        disease: DiseaseId,
        duration: u32,
        infected: usize,
    },
    Ended {
        disease: DiseaseId,
        cured: usize,
    },
}

/// Pool of registered diseases with at most one active at a time.
#[derive(Clone, Debug, Default)]
pub struct Outbreaks {
    pool: Vec<Disease>,
    active: Option<usize>,
}

impl Outbreaks {
    pub fn new(configs: &[DiseaseConfig]) -> Self {
        Self::try_new(configs).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Register `configs` in order. Ids are pool indices, so the pool is
    /// capped at [`SimConfig::MAX_DISEASES`].
    pub fn try_new(configs: &[DiseaseConfig]) -> Result<Self, SimConfigError> {
        if configs.len() > SimConfig::MAX_DISEASES {
            return Err(SimConfigError::TooManyDiseases {
                max: SimConfig::MAX_DISEASES,
                actual: configs.len(),
            });
        }
        let pool = configs
            .iter()
            .zip(0u8..)
            .map(|(config, idx)| Disease {
                id: DiseaseId(idx),
                config: config.clone(),
                cycle: EventCycle::default(),
            })
            .collect();
        Ok(Self { pool, active: None })
    }

    pub fn pool(&self) -> &[Disease] {
        &self.pool
    }

    pub fn get(&self, id: DiseaseId) -> Option<&Disease> {
        self.pool.get(id.0 as usize)
    }

    pub fn active(&self) -> Option<&Disease> {
        self.active.map(|idx| &self.pool[idx])
    }

    /// One scheduler tick: maybe trigger a random candidate, or count the
    /// active outbreak down and cure all carriers when it runs out.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        tick: u64,
        pop: &mut Population,
        rng: &mut R,
    ) -> Option<OutbreakChange> {
        match self.active {
            None => {
                if self.pool.is_empty() {
                    return None;
                }
                let idx = rng.random_range(0..self.pool.len());
                let timing = self.pool[idx].config.timing;
                if !self.pool[idx].cycle.should_trigger(tick, &timing, rng) {
                    return None;
                }
                Some(self.trigger(idx, tick, pop, rng))
            }
            Some(idx) => {
                let disease = &mut self.pool[idx];
                match disease.cycle.count_down(tick) {
                    Countdown::Running { .. } => None,
                    Countdown::Ended => {
                        let id = disease.id;
                        let cured = pop.cure_all(id);
                        debug!(disease = %disease.config.name, tick, cured, "outbreak ended");
                        self.active = None;
                        Some(OutbreakChange::Ended { disease: id, cured })
                    }
                }
            }
        }
    }

    /// Activate pool entry `idx` unconditionally and seed it into one random
    /// region of the grid.
    pub(crate) fn trigger<R: Rng + ?Sized>(
        &mut self,
        idx: usize,
        tick: u64,
        pop: &mut Population,
        rng: &mut R,
    ) -> OutbreakChange {
        let disease = &mut self.pool[idx];
        let duration = disease.config.timing.roll_duration(rng, MIN_OUTBREAK_TICKS);
        disease.cycle.activate(tick, duration);
        self.active = Some(idx);

        let disease = &self.pool[idx];
        let region = pop.grid().random_region(rng);
        let mut infected = 0;
        for loc in region.cells {
            let Some((id, entity)) = pop.occupant(loc) else {
                continue;
            };
            if !disease.affects(entity.kind()) {
                continue;
            }
            pop.infect(id, disease.id);
            pop.change_energy(id, disease.config.damage_points);
            infected += 1;
        }
        debug!(
            disease = %disease.config.name,
            tick,
            duration,
            infected,
            region_radius = region.radius,
            "outbreak started"
        );
        OutbreakChange::Started {
            disease: disease.id,
            duration,
            infected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Sex;
    use crate::kind::KindTable;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn certain_ebola() -> DiseaseConfig {
        let mut cfg = DiseaseConfig::ebola();
        cfg.timing.probability = 1.0;
        cfg.timing.cooldown = 0;
        cfg
    }

    fn crowded_humans(depth: usize, width: usize) -> Population {
        let mut pop = Population::new(depth, width, KindTable::default());
        let locs: Vec<_> = pop.grid().locations().collect();
        for loc in locs {
            pop.spawn(Kind::Human, loc, 0, 50, Sex::Female);
        }
        pop
    }

    #[test]
    fn trigger_rolls_duration_in_bounds() {
        let mut rng = ChaCha12Rng::seed_from_u64(41);
        for _ in 0..200 {
            let mut pop = crowded_humans(6, 6);
            let mut outbreaks = Outbreaks::new(&[certain_ebola()]);
            match outbreaks.trigger(0, 1, &mut pop, &mut rng) {
                OutbreakChange::Started { duration, .. } => {
                    assert!((10..=29).contains(&duration), "duration {duration}");
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn trigger_infects_and_damages_susceptible_entities() {
        let mut rng = ChaCha12Rng::seed_from_u64(42);
        let mut pop = crowded_humans(10, 10);
        let mut outbreaks = Outbreaks::new(&[certain_ebola()]);
        let OutbreakChange::Started { infected, .. } =
            outbreaks.trigger(0, 1, &mut pop, &mut rng)
        else {
            panic!("expected a start");
        };
        let carriers: Vec<_> = pop
            .grid()
            .occupied()
            .filter_map(|(_, id)| pop.get(id))
            .filter(|e| e.is_infected())
            .collect();
        assert_eq!(carriers.len(), infected);
        assert!(carriers.iter().all(|e| e.energy() == 40));
    }

    #[test]
    fn unaffected_kinds_are_not_infected() {
        let mut rng = ChaCha12Rng::seed_from_u64(43);
        let mut pop = Population::new(8, 8, KindTable::default());
        let locs: Vec<_> = pop.grid().locations().collect();
        for loc in locs {
            pop.spawn(Kind::Dragon, loc, 0, 50, Sex::Male);
        }
        let mut outbreaks = Outbreaks::new(&[certain_ebola()]);
        let change = outbreaks.trigger(0, 1, &mut pop, &mut rng);
        assert!(matches!(change, OutbreakChange::Started { infected: 0, .. }));
    }

    #[test]
    fn outbreak_ends_with_no_carriers_left() {
        let mut rng = ChaCha12Rng::seed_from_u64(44);
        let mut pop = crowded_humans(10, 10);
        let mut outbreaks = Outbreaks::new(&[certain_ebola()]);
        let OutbreakChange::Started { duration, .. } =
            outbreaks.advance(1, &mut pop, &mut rng).expect("certain trigger")
        else {
            panic!("expected a start");
        };
        let mut tick = 1;
        for _ in 1..duration {
            tick += 1;
            assert_eq!(outbreaks.advance(tick, &mut pop, &mut rng), None);
            assert!(outbreaks.active().is_some());
        }
        tick += 1;
        let ended = outbreaks.advance(tick, &mut pop, &mut rng);
        assert!(matches!(ended, Some(OutbreakChange::Ended { .. })));
        assert!(outbreaks.active().is_none());
        assert!(pop
            .grid()
            .occupied()
            .all(|(_, id)| !pop.get(id).unwrap().carries(DiseaseId(0))));
        assert_eq!(
            outbreaks.pool()[0].state(),
            EventState::Idle {
                last_deactivated: tick
            }
        );
    }

    #[test]
    fn cooldown_delays_the_next_outbreak() {
        let mut rng = ChaCha12Rng::seed_from_u64(45);
        let mut pop = crowded_humans(4, 4);
        let mut cfg = certain_ebola();
        cfg.timing.cooldown = 10;
        let mut outbreaks = Outbreaks::new(&[cfg]);
        for tick in 1..10 {
            assert_eq!(outbreaks.advance(tick, &mut pop, &mut rng), None);
        }
        assert!(outbreaks.advance(10, &mut pop, &mut rng).is_some());
    }

    #[test]
    fn pool_ids_are_distinct_and_capped() {
        let configs = vec![certain_ebola(); SimConfig::MAX_DISEASES];
        let outbreaks = Outbreaks::try_new(&configs).unwrap();
        let ids: std::collections::BTreeSet<_> =
            outbreaks.pool().iter().map(Disease::id).collect();
        assert_eq!(ids.len(), SimConfig::MAX_DISEASES);

        let configs = vec![certain_ebola(); 300];
        assert_eq!(
            Outbreaks::try_new(&configs).err(),
            Some(SimConfigError::TooManyDiseases {
                max: SimConfig::MAX_DISEASES,
                actual: 300
            })
        );
    }

    #[test]
    fn spread_damages_every_neighbor() {
        let mut rng = ChaCha12Rng::seed_from_u64(46);
        let mut pop = Population::new(5, 5, KindTable::default());
        let center = pop.grid().location(2, 2).unwrap();
        let carrier = pop.spawn(Kind::Human, center, 0, 50, Sex::Male).unwrap();
        let dragon = pop
            .spawn(Kind::Dragon, pop.grid().location(1, 1).unwrap(), 0, 50, Sex::Male)
            .unwrap();
        let weak = pop
            .spawn(Kind::Grass, pop.grid().location(3, 3).unwrap(), 0, 5, Sex::Male)
            .unwrap();
        let far = pop
            .spawn(Kind::Human, pop.grid().location(0, 4).unwrap(), 0, 50, Sex::Male)
            .unwrap();
        let outbreaks = Outbreaks::new(&[certain_ebola()]);
        outbreaks.pool()[0].spread(&mut pop, carrier, &mut rng);
        assert_eq!(pop.get(dragon).unwrap().energy(), 40);
        assert!(!pop.is_alive(weak));
        assert_eq!(pop.get(far).unwrap().energy(), 50);
        assert_eq!(pop.get(carrier).unwrap().energy(), 50);
    }
}
