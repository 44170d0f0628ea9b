use super::World;
use crate::grid::Location;
use crate::kind::Kind;
use serde::{Deserialize, Serialize};

/// Snapshot returned by [`World::step`] and [`World::reset`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStatus {
    pub tick: u64,
    pub is_day: bool,
    pub disease: Option<String>,
    pub weather: Option<String>,
}

impl StepStatus {
    pub fn disease_label(&self) -> &str {
        self.disease.as_deref().unwrap_or("none")
    }

    pub fn weather_label(&self) -> &str {
        self.weather.as_deref().unwrap_or("none")
    }
}

/// One occupied cell as seen by renderers and viability checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CellView {
    pub location: Location,
    pub kind: Kind,
    pub infected: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationStats {
    /// Indexed by [`Kind::index`].
    pub counts: [usize; Kind::COUNT],
    pub total: usize,
    pub infected: usize,
}

impl PopulationStats {
    pub fn count(&self, kind: Kind) -> usize {
        self.counts[kind.index()]
    }

    /// Number of kinds with at least one live member.
    pub fn kinds_alive(&self) -> usize {
        self.counts.iter().filter(|&&n| n > 0).count()
    }

    /// The driver's viability rule: two or more kinds still present.
    pub fn is_viable(&self) -> bool {
        self.kinds_alive() >= 2
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepMetrics {
    pub tick: u64,
    pub is_day: bool,
    pub disease: Option<String>,
    pub weather: Option<String>,
    pub birth_count: usize,
    pub death_count: usize,
    pub population: PopulationStats,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub steps: usize,
    pub sample_every: usize,
    pub samples: Vec<StepMetrics>,
    pub total_births: usize,
    pub total_deaths: usize,
    pub final_population: PopulationStats,
}

fn default_schema_version() -> u32 {
    1
}

impl World {
    pub fn population(&self) -> PopulationStats {
        let mut stats = PopulationStats::default();
        for cell in self.cells() {
            stats.counts[cell.kind.index()] += 1;
            stats.total += 1;
            if cell.infected {
                stats.infected += 1;
            }
        }
        stats
    }

    pub fn step_metrics(&self) -> StepMetrics {
        let status = self.status();
        StepMetrics {
            tick: status.tick,
            is_day: status.is_day,
            disease: status.disease,
            weather: status.weather,
            birth_count: self.births_last_step,
            death_count: self.deaths_last_step,
            population: self.population(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_default_to_none() {
        let status = StepStatus {
            tick: 3,
            is_day: true,
            disease: None,
            weather: Some("Raining".to_string()),
        };
        assert_eq!(status.disease_label(), "none");
        assert_eq!(status.weather_label(), "Raining");
    }

    #[test]
    fn viability_needs_two_kinds() {
        let mut stats = PopulationStats::default();
        stats.counts[Kind::Zombie.index()] = 12;
        assert_eq!(stats.kinds_alive(), 1);
        assert!(!stats.is_viable());
        stats.counts[Kind::Grass.index()] = 1;
        assert!(stats.is_viable());
    }

    #[test]
    fn run_summary_parses_without_schema_version() {
        let summary: RunSummary = serde_json::from_str(r#"{"steps": 4}"#).unwrap();
        assert_eq!(summary.schema_version, 1);
        assert_eq!(summary.steps, 4);
        assert!(summary.samples.is_empty());
    }
}
