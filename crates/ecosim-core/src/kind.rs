use crate::config::SimConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Species tag. The set is closed; per-kind tuning lives in [`KindConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Grass,
    Human,
    Zombie,
    HellHound,
    Dragon,
}

impl Kind {
    pub const COUNT: usize = 5;
    pub const ALL: [Kind; Kind::COUNT] = [
        Kind::Grass,
        Kind::Human,
        Kind::Zombie,
        Kind::HellHound,
        Kind::Dragon,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::Grass => "grass",
            Kind::Human => "human",
            Kind::Zombie => "zombie",
            Kind::HellHound => "hell_hound",
            Kind::Dragon => "dragon",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bit set over [`Kind`]. Serialized as a list of kind names.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Kind>", into = "Vec<Kind>")]
pub struct KindSet(u8);

impl KindSet {
    pub const EMPTY: KindSet = KindSet(0);

    pub fn of(kinds: &[Kind]) -> Self {
        kinds.iter().copied().collect()
    }

    pub fn contains(self, kind: Kind) -> bool {
        self.0 & (1 << kind.index()) != 0
    }

    pub fn insert(&mut self, kind: Kind) {
        self.0 |= 1 << kind.index();
    }

    pub fn iter(self) -> impl Iterator<Item = Kind> {
        Kind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl FromIterator<Kind> for KindSet {
    fn from_iter<I: IntoIterator<Item = Kind>>(iter: I) -> Self {
        let mut set = KindSet::EMPTY;
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl From<Vec<Kind>> for KindSet {
    fn from(kinds: Vec<Kind>) -> Self {
        kinds.into_iter().collect()
    }
}

impl From<KindSet> for Vec<Kind> {
    fn from(set: KindSet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Debug for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Which behavior strategy drives a kind each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Role {
    /// Needs a mate to breed, hunts `prey`, moves every tick.
    Predator { prey: KindSet },
    /// Breeds without a mate, never moves, wilts without restorative weather.
    Plant,
}

/// Immutable per-kind parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KindConfig {
    pub role: Role,
    pub breeding_age: u32,
    pub max_age: u32,
    pub breeding_probability: f64,
    pub birth_limit: u32,
    pub newborn_energy: i32,
    pub max_energy: i32,
    pub sleeps: bool,
    /// Energy granted to whatever eats an entity of this kind.
    pub food_value: i32,
}

impl KindConfig {
    pub fn is_predator(&self) -> bool {
        matches!(self.role, Role::Predator { .. })
    }

    pub fn prey(&self) -> KindSet {
        match self.role {
            Role::Predator { prey } => prey,
            Role::Plant => KindSet::EMPTY,
        }
    }

    pub fn validate(&self, kind: Kind) -> Result<(), SimConfigError> {
        if !(0.0..=1.0).contains(&self.breeding_probability) {
            return Err(SimConfigError::InvalidBreedingProbability {
                kind,
                value: self.breeding_probability,
            });
        }
        if self.birth_limit == 0 {
            return Err(SimConfigError::InvalidBirthLimit { kind });
        }
        if self.max_energy <= 0 {
            return Err(SimConfigError::InvalidMaxEnergy {
                kind,
                value: self.max_energy,
            });
        }
        if self.newborn_energy < 1 || self.newborn_energy > self.max_energy {
            return Err(SimConfigError::InvalidNewbornEnergy {
                kind,
                value: self.newborn_energy,
                max: self.max_energy,
            });
        }
        if self.max_age == 0 || self.breeding_age > self.max_age {
            return Err(SimConfigError::InvalidAgeBounds {
                kind,
                breeding_age: self.breeding_age,
                max_age: self.max_age,
            });
        }
        Ok(())
    }
}

/// One [`KindConfig`] per [`Kind`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindTable {
    pub grass: KindConfig,
    pub human: KindConfig,
    pub zombie: KindConfig,
    pub hell_hound: KindConfig,
    pub dragon: KindConfig,
}

impl KindTable {
    pub fn get(&self, kind: Kind) -> &KindConfig {
        match kind {
            Kind::Grass => &self.grass,
            Kind::Human => &self.human,
            Kind::Zombie => &self.zombie,
            Kind::HellHound => &self.hell_hound,
            Kind::Dragon => &self.dragon,
        }
    }

    pub fn validate(&self) -> Result<(), SimConfigError> {
        Kind::ALL
            .into_iter()
            .try_for_each(|kind| self.get(kind).validate(kind))
    }
}

impl Default for KindTable {
    fn default() -> Self {
        Self {
            grass: KindConfig {
                role: Role::Plant,
                breeding_age: 10,
                max_age: 15,
                breeding_probability: 0.15,
                birth_limit: 2,
                newborn_energy: 10,
                max_energy: 15,
                sleeps: true,
                food_value: 10,
            },
            human: KindConfig {
                role: Role::Predator {
                    prey: KindSet::of(&[Kind::Grass]),
                },
                breeding_age: 20,
                max_age: 80,
                breeding_probability: 0.2,
                birth_limit: 2,
                newborn_energy: 1,
                max_energy: 50,
                sleeps: true,
                food_value: 15,
            },
            zombie: KindConfig {
                role: Role::Predator {
                    prey: KindSet::of(&[Kind::Human]),
                },
                breeding_age: 20,
                max_age: 100,
                breeding_probability: 0.1,
                birth_limit: 3,
                newborn_energy: 30,
                max_energy: 50,
                sleeps: false,
                food_value: 10,
            },
            hell_hound: KindConfig {
                role: Role::Predator {
                    prey: KindSet::of(&[Kind::Zombie]),
                },
                breeding_age: 6,
                max_age: 200,
                breeding_probability: 0.16,
                birth_limit: 4,
                newborn_energy: 10,
                max_energy: 50,
                sleeps: false,
                food_value: 10,
            },
            dragon: KindConfig {
                role: Role::Predator {
                    prey: KindSet::of(&[Kind::Zombie, Kind::HellHound]),
                },
                breeding_age: 15,
                max_age: 300,
                breeding_probability: 0.09,
                birth_limit: 3,
                newborn_energy: 20,
                max_energy: 100,
                sleeps: true,
                food_value: 50,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_valid() {
        assert_eq!(KindTable::default().validate(), Ok(()));
    }

    #[test]
    fn only_grass_is_a_plant() {
        let table = KindTable::default();
        let plants: Vec<Kind> = Kind::ALL
            .into_iter()
            .filter(|k| !table.get(*k).is_predator())
            .collect();
        assert_eq!(plants, vec![Kind::Grass]);
        assert!(table.get(Kind::Dragon).prey().contains(Kind::HellHound));
        assert!(!table.get(Kind::Dragon).prey().contains(Kind::Human));
    }

    #[test]
    fn kind_set_serializes_as_names() {
        let set = KindSet::of(&[Kind::Zombie, Kind::Grass]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["grass","zombie"]"#);
        let back: KindSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn newborn_energy_above_max_is_rejected() {
        let mut table = KindTable::default();
        table.human.newborn_energy = 60;
        assert!(matches!(
            table.validate(),
            Err(SimConfigError::InvalidNewbornEnergy {
                kind: Kind::Human,
                ..
            })
        ));
    }
}
