//! Configuration system for mimicry simulations.
//!
//! Supports YAML configuration files with sensible defaults.

use crate::ecology::{Limit, PredatorPool, PredatorSpecies, PredatorTraits, PreyPool, PreySpecies};
use crate::error::{Result, SimError};
use crate::generation::Schedule;
use crate::simulation::Simulation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub prey: Vec<PreyConfig>,
    #[serde(default)]
    pub predators: Vec<PredatorConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Run schedule configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Used for output file names
    pub title: String,
    /// Encounters per generation
    pub encounters: u32,
    /// Generations per trial
    pub generations: u32,
    /// Independent trials
    pub repetitions: u32,
    /// Rescale prey to the original total after each generation
    #[serde(default)]
    pub repopulate: bool,
    /// Fixed seed; a random one is drawn and logged when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// One prey species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreyConfig {
    pub name: String,
    pub population: u32,
    pub phenotype: String,
    #[serde(default = "default_size")]
    pub size: f64,
    pub camouflage: f64,
    pub palatability: f64,
}

/// One predator species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredatorConfig {
    pub name: String,
    pub population: u32,
    /// Prey size eaten before satiation; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appetite: Option<u32>,
    /// Experiences kept per phenotype; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u32>,
    #[serde(default = "default_insatiable")]
    pub insatiable: bool,
}

/// Result output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Emit every generation instead of the last one per trial
    pub verbose: bool,
    /// Keep per-individual predator traces
    pub traces: bool,
    /// Also write the JSON stats history
    pub json: bool,
    /// Constant columns appended to every CSV row
    #[serde(default)]
    pub extra_columns: BTreeMap<String, String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Records between printed summary lines
    pub summary_interval: u32,
}

fn default_size() -> f64 {
    1.0
}

fn default_insatiable() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            prey: vec![
                PreyConfig {
                    name: "wasp".to_string(),
                    population: 100,
                    phenotype: "stripes".to_string(),
                    size: 1.0,
                    camouflage: 0.5,
                    palatability: 0.0,
                },
                PreyConfig {
                    name: "hoverfly".to_string(),
                    population: 100,
                    phenotype: "stripes".to_string(),
                    size: 1.0,
                    camouflage: 0.5,
                    palatability: 1.0,
                },
                PreyConfig {
                    name: "fly".to_string(),
                    population: 100,
                    phenotype: "plain".to_string(),
                    size: 1.0,
                    camouflage: 0.5,
                    palatability: 1.0,
                },
            ],
            predators: vec![PredatorConfig {
                name: "bird".to_string(),
                population: 10,
                appetite: Some(10),
                memory: Some(10),
                insatiable: true,
            }],
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            title: "batesian".to_string(),
            encounters: 500,
            generations: 20,
            repetitions: 5,
            repopulate: true,
            seed: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            verbose: true,
            traces: false,
            json: false,
            extra_columns: BTreeMap::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            summary_interval: 1,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values by building the simulation they describe
    pub fn validate(&self) -> Result<()> {
        if self.logging.summary_interval == 0 {
            return Err(SimError::invalid("summary_interval", "must be at least 1"));
        }
        self.to_simulation().map(|_| ())
    }

    /// Build the simulation this configuration describes
    pub fn to_simulation(&self) -> Result<Simulation> {
        let mut prey = PreyPool::new();
        for p in &self.prey {
            let species = PreySpecies::new(
                p.phenotype.as_str(),
                p.population,
                p.size,
                p.camouflage,
                p.palatability,
            )?;
            prey.add(p.name.as_str(), species)?;
        }

        let mut predators = PredatorPool::new();
        for p in &self.predators {
            let traits = PredatorTraits {
                appetite: Limit::from_option("appetite", p.appetite)?,
                memory: Limit::from_option("memory", p.memory)?,
                insatiable: p.insatiable,
            };
            predators.add(p.name.as_str(), PredatorSpecies::new(p.population, traits))?;
        }

        let schedule = Schedule {
            encounters: self.simulation.encounters,
            generations: self.simulation.generations,
            repopulate: self.simulation.repopulate,
        };

        Simulation::new(
            self.simulation.title.as_str(),
            prey,
            predators,
            schedule,
            self.simulation.repetitions,
        )
    }

    /// Describe an existing simulation. Output and logging sections take
    /// their defaults; the seed is left unset.
    pub fn from_simulation(sim: &Simulation) -> Self {
        let prey = sim
            .prey()
            .iter()
            .map(|(name, p)| PreyConfig {
                name: name.to_string(),
                population: p.original_population(),
                phenotype: p.phenotype().to_string(),
                size: p.size(),
                camouflage: p.camouflage(),
                palatability: p.palatability(),
            })
            .collect();

        let predators = sim
            .predators()
            .iter()
            .map(|(name, s)| {
                let traits = s.traits();
                PredatorConfig {
                    name: name.to_string(),
                    population: s.population() as u32,
                    appetite: traits.appetite.value(),
                    memory: traits.memory.value(),
                    insatiable: traits.insatiable,
                }
            })
            .collect();

        Self {
            simulation: SimulationConfig {
                title: sim.title().to_string(),
                encounters: sim.encounters(),
                generations: sim.generations(),
                repetitions: sim.repetitions(),
                repopulate: sim.repopulate(),
                seed: None,
            },
            prey,
            predators,
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.simulation.seed = Some(9);
        config
            .output
            .extra_columns
            .insert("treatment".to_string(), "batesian".to_string());

        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        config.save(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let yaml = r#"
simulation:
  title: minimal
  encounters: 10
  generations: 1
  repetitions: 1
prey:
  - name: moth
    population: 10
    phenotype: brown
    camouflage: 0.0
    palatability: 1.0
predators:
  - name: bat
    population: 1
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.simulation.repopulate);
        assert_eq!(config.simulation.seed, None);
        assert_eq!(config.prey[0].size, 1.0);
        assert_eq!(config.predators[0].appetite, None);
        assert!(config.predators[0].insatiable);
        assert_eq!(config.logging.log_level, "info");

        let sim = config.to_simulation().unwrap();
        let bat = sim.predators().get("bat").unwrap();
        assert!(bat.traits().appetite.is_unbounded());
        assert!(bat.traits().memory.is_unbounded());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.prey[0].camouflage = 1.5;
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidParameter { field: "camouflage", .. })
        ));

        let mut config = Config::default();
        config.predators[0].appetite = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.simulation.generations = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.prey[1].name = config.prey[0].name.clone();
        assert!(matches!(config.validate(), Err(SimError::DuplicateSpecies(_))));
    }

    #[test]
    fn test_from_simulation_describes_simulation() {
        let config = Config::default();
        let sim = config.to_simulation().unwrap();
        let described = Config::from_simulation(&sim);

        // Pools are name-ordered, so compare as sets
        assert_eq!(described.prey.len(), config.prey.len());
        for p in &config.prey {
            assert!(described.prey.contains(p));
        }
        assert_eq!(described.predators, config.predators);
        assert_eq!(described.simulation, config.simulation);
        assert_eq!(described.to_simulation().unwrap(), sim);
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Config::from_file(dir.path().join("absent.yaml")),
            Err(SimError::Io(_))
        ));
    }
}
