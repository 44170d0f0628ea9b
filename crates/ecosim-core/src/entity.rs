use crate::disease::DiseaseId;
use crate::grid::Location;
use crate::kind::{Kind, KindConfig};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeSet;

/// Probability that a new entity is female.
const FEMALE_PROBABILITY: f64 = 0.5;

/// Handle into the population's entity slots. Grid cells hold these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(FEMALE_PROBABILITY) {
            Sex::Female
        } else {
            Sex::Male
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Sex::Female => Sex::Male,
            Sex::Male => Sex::Female,
        }
    }
}

/// Per-instance mutable state. Static tuning is looked up by `kind`.
///
/// The state-changing methods here only touch the entity itself; keeping the
/// grid in sync is the job of [`crate::population::Population`], which is why
/// they are crate-private.
#[derive(Clone, Debug)]
pub struct Entity {
    kind: Kind,
    age: u32,
    energy: i32,
    sex: Sex,
    location: Option<Location>,
    diseases: BTreeSet<DiseaseId>,
}

impl Entity {
    pub(crate) fn new(kind: Kind, location: Location, age: u32, energy: i32, sex: Sex) -> Self {
        debug_assert!(energy >= 1, "a live entity needs positive energy");
        Self {
            kind,
            age,
            energy,
            sex,
            location: Some(location),
            diseases: BTreeSet::new(),
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn energy(&self) -> i32 {
        self.energy
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn is_alive(&self) -> bool {
        self.location.is_some()
    }

    pub fn can_breed(&self, config: &KindConfig) -> bool {
        self.age >= config.breeding_age
    }

    pub fn carries(&self, disease: DiseaseId) -> bool {
        self.diseases.contains(&disease)
    }

    pub fn is_infected(&self) -> bool {
        !self.diseases.is_empty()
    }

    pub fn diseases(&self) -> impl Iterator<Item = DiseaseId> + '_ {
        self.diseases.iter().copied()
    }

    pub(crate) fn infect(&mut self, disease: DiseaseId) {
        self.diseases.insert(disease);
    }

    pub(crate) fn cure(&mut self, disease: DiseaseId) -> bool {
        self.diseases.remove(&disease)
    }

    /// Age by one tick. Returns `false` once the entity is past `max_age`.
    pub(crate) fn grow_older(&mut self, config: &KindConfig) -> bool {
        self.age = self.age.saturating_add(1);
        self.age <= config.max_age
    }

    /// Apply `delta`, clamping to `max_energy`. Returns `false` when the
    /// result is zero or below; energy is left untouched in that case.
    pub(crate) fn shift_energy(&mut self, delta: i32, config: &KindConfig) -> bool {
        let next = self.energy.saturating_add(delta);
        if next <= 0 {
            return false;
        }
        self.energy = next.min(config.max_energy);
        true
    }

    pub(crate) fn set_location(&mut self, location: Location) {
        self.location = Some(location);
    }

    /// Returns the cell the entity occupied, if it was alive.
    pub(crate) fn mark_dead(&mut self) -> Option<Location> {
        self.location.take()
    }
}
