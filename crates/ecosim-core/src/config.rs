use crate::disease::DiseaseConfig;
use crate::kind::{Kind, KindTable};
use crate::weather::WeatherConfig;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};
use tracing::warn;

/// Chance that a cell is claimed by each kind when the population is seeded.
///
/// Kinds are tried in [`SeedingConfig::PRIORITY`] order and the first
/// successful roll claims the cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedingConfig {
    pub dragon: f64,
    pub zombie: f64,
    pub hell_hound: f64,
    pub human: f64,
    pub grass: f64,
}

impl SeedingConfig {
    pub const PRIORITY: [Kind; Kind::COUNT] = [
        Kind::Dragon,
        Kind::Zombie,
        Kind::HellHound,
        Kind::Human,
        Kind::Grass,
    ];

    /// Seeds nothing; handy for hand-built scenarios.
    pub fn empty() -> Self {
        Self {
            dragon: 0.0,
            zombie: 0.0,
            hell_hound: 0.0,
            human: 0.0,
            grass: 0.0,
        }
    }

    pub fn probability(&self, kind: Kind) -> f64 {
        match kind {
            Kind::Dragon => self.dragon,
            Kind::Zombie => self.zombie,
            Kind::HellHound => self.hell_hound,
            Kind::Human => self.human,
            Kind::Grass => self.grass,
        }
    }
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            dragon: 0.02,
            zombie: 0.04,
            hell_hound: 0.06,
            human: 0.08,
            grass: 0.09,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Grid rows. Zero falls back to [`SimConfig::DEFAULT_DEPTH`].
    pub depth: usize,
    /// Grid columns. Zero falls back to [`SimConfig::DEFAULT_WIDTH`].
    pub width: usize,
    pub seed: u64,
    /// Ticks between day/night flips.
    pub day_length: u64,
    pub seeding: SeedingConfig,
    pub kinds: KindTable,
    pub diseases: Vec<DiseaseConfig>,
    pub weathers: Vec<WeatherConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            depth: Self::DEFAULT_DEPTH,
            width: Self::DEFAULT_WIDTH,
            seed: 42,
            day_length: 5,
            seeding: SeedingConfig::default(),
            kinds: KindTable::default(),
            diseases: vec![DiseaseConfig::ebola()],
            weathers: vec![WeatherConfig::rain()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimConfigError {
    InvalidSeedingProbability {
        kind: Kind,
        value: f64,
    },
    InvalidBreedingProbability {
        kind: Kind,
        value: f64,
    },
    InvalidBirthLimit {
        kind: Kind,
    },
    InvalidMaxEnergy {
        kind: Kind,
        value: i32,
    },
    InvalidNewbornEnergy {
        kind: Kind,
        value: i32,
        max: i32,
    },
    InvalidAgeBounds {
        kind: Kind,
        breeding_age: u32,
        max_age: u32,
    },
    InvalidEventProbability {
        name: String,
        value: f64,
    },
    InvalidEventLength {
        name: String,
    },
    InvalidDayLength,
    TooManyDiseases {
        max: usize,
        actual: usize,
    },
    Parse(String),
}

impl fmt::Display for SimConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimConfigError::InvalidSeedingProbability { kind, value } => {
                write!(f, "seeding probability for {kind} must be in [0, 1], got {value}")
            }
            SimConfigError::InvalidBreedingProbability { kind, value } => {
                write!(f, "breeding probability for {kind} must be in [0, 1], got {value}")
            }
            SimConfigError::InvalidBirthLimit { kind } => {
                write!(f, "birth limit for {kind} must be positive")
            }
            SimConfigError::InvalidMaxEnergy { kind, value } => {
                write!(f, "max energy for {kind} must be positive, got {value}")
            }
            SimConfigError::InvalidNewbornEnergy { kind, value, max } => write!(
                f,
                "newborn energy for {kind} must be in [1, {max}], got {value}"
            ),
            SimConfigError::InvalidAgeBounds {
                kind,
                breeding_age,
                max_age,
            } => write!(
                f,
                "{kind}: max age ({max_age}) must be positive and at least the breeding age ({breeding_age})"
            ),
            SimConfigError::InvalidEventProbability { name, value } => {
                write!(f, "probability of {name} must be in [0, 1], got {value}")
            }
            SimConfigError::InvalidEventLength { name } => {
                write!(f, "max length of {name} must be positive")
            }
            SimConfigError::InvalidDayLength => write!(f, "day_length must be positive"),
            SimConfigError::TooManyDiseases { max, actual } => {
                write!(f, "at most {max} diseases can be registered, got {actual}")
            }
            SimConfigError::Parse(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl Error for SimConfigError {}

impl SimConfig {
    pub const DEFAULT_DEPTH: usize = 80;
    pub const DEFAULT_WIDTH: usize = 120;
    pub const MAX_DISEASES: usize = 32;

    pub fn from_json(json: &str) -> Result<Self, SimConfigError> {
        serde_json::from_str(json).map_err(|e| SimConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), SimConfigError> {
        for kind in SeedingConfig::PRIORITY {
            let value = self.seeding.probability(kind);
            if !(0.0..=1.0).contains(&value) {
                return Err(SimConfigError::InvalidSeedingProbability { kind, value });
            }
        }
        self.kinds.validate()?;
        if self.day_length == 0 {
            return Err(SimConfigError::InvalidDayLength);
        }
        if self.diseases.len() > Self::MAX_DISEASES {
            return Err(SimConfigError::TooManyDiseases {
                max: Self::MAX_DISEASES,
                actual: self.diseases.len(),
            });
        }
        self.diseases.iter().try_for_each(DiseaseConfig::validate)?;
        self.weathers.iter().try_for_each(WeatherConfig::validate)?;
        Ok(())
    }

    /// Grid dimensions to build with. Zero in either axis is not an error:
    /// both fall back to the defaults with a warning.
    pub fn grid_dimensions(&self) -> (usize, usize) {
        if self.depth == 0 || self.width == 0 {
            warn!(
                depth = self.depth,
                width = self.width,
                "grid dimensions must be greater than zero; using defaults"
            );
            (Self::DEFAULT_DEPTH, Self::DEFAULT_WIDTH)
        } else {
            (self.depth, self.width)
        }
    }

    /// Config with the given signed dimensions and seed. Non-positive
    /// dimensions are stored as zero and resolved by
    /// [`SimConfig::grid_dimensions`].
    pub fn with_dimensions(depth: i64, width: i64, seed: u64) -> Self {
        let to_axis = |v: i64| usize::try_from(v).unwrap_or(0);
        Self {
            depth: to_axis(depth),
            width: to_axis(width),
            seed,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_dimensions_fall_back_to_defaults() {
        let cfg = SimConfig::with_dimensions(0, 50, 1);
        assert_eq!(cfg.grid_dimensions(), (80, 120));
        let cfg = SimConfig::with_dimensions(-3, -3, 1);
        assert_eq!(cfg.grid_dimensions(), (80, 120));
        let cfg = SimConfig::with_dimensions(10, 20, 1);
        assert_eq!(cfg.grid_dimensions(), (10, 20));
    }

    #[test]
    fn out_of_range_probabilities_are_rejected() {
        let mut cfg = SimConfig::default();
        cfg.seeding.zombie = 1.2;
        assert_eq!(
            cfg.validate(),
            Err(SimConfigError::InvalidSeedingProbability {
                kind: Kind::Zombie,
                value: 1.2
            })
        );

        let mut cfg = SimConfig::default();
        cfg.weathers[0].timing.probability = -0.1;
        assert!(matches!(
            cfg.validate(),
            Err(SimConfigError::InvalidEventProbability { .. })
        ));

        let mut cfg = SimConfig::default();
        cfg.diseases[0].timing.max_length = 0;
        assert!(matches!(
            cfg.validate(),
            Err(SimConfigError::InvalidEventLength { .. })
        ));
    }

    #[test]
    fn partial_json_overrides_defaults() {
        let cfg = SimConfig::from_json(
            r#"{"depth": 12, "seed": 7, "seeding": {"grass": 0.5}, "weathers": []}"#,
        )
        .unwrap();
        assert_eq!(cfg.depth, 12);
        assert_eq!(cfg.width, SimConfig::DEFAULT_WIDTH);
        assert_eq!(cfg.seeding.grass, 0.5);
        assert_eq!(cfg.seeding.dragon, 0.02);
        assert!(cfg.weathers.is_empty());
        assert_eq!(cfg.diseases.len(), 1);
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = SimConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(SimConfig::from_json(&json).unwrap(), cfg);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            SimConfig::from_json("{depth: 1"),
            Err(SimConfigError::Parse(_))
        ));
    }
}
