//! Per-generation population snapshots and their history.

use crate::ecology::{PredatorPool, PreyPool};
use crate::error::Result;
use crate::generation::GenerationRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Prey counts for one species
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreyCounts {
    pub surviving: u32,
    pub original: u32,
}

/// One predator's learned state, flattened for reporting
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PredatorTrace {
    pub index: usize,
    pub eaten: f64,
    /// Phenotype -> remembered experiences
    pub experiences: BTreeMap<String, Vec<f64>>,
    /// Phenotype -> resulting preference
    pub preferences: BTreeMap<String, f64>,
}

/// Predator counts for one species
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PredatorCounts {
    pub population: usize,
    pub hungry: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traces: Vec<PredatorTrace>,
}

/// Statistics snapshot for one generation of one trial
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationSnapshot {
    pub trial: u32,
    pub generation: u32,
    pub prey: BTreeMap<String, PreyCounts>,
    pub predators: BTreeMap<String, PredatorCounts>,
}

impl GenerationSnapshot {
    /// Summarise a record. Per-individual traces are only collected when
    /// `with_traces` is set, since they grow with the predator population.
    pub fn from_record(record: &GenerationRecord, with_traces: bool) -> Self {
        Self {
            trial: record.trial,
            generation: record.generation,
            prey: prey_counts(&record.prey),
            predators: predator_counts(&record.predators, with_traces),
        }
    }

    /// Total surviving prey
    pub fn prey_total(&self) -> u64 {
        self.prey.values().map(|c| c.surviving as u64).sum()
    }

    /// Total hungry predators
    pub fn hungry_total(&self) -> usize {
        self.predators.values().map(|c| c.hungry).sum()
    }

    /// Format as a one-line summary
    pub fn summary(&self) -> String {
        let species: Vec<String> = self
            .prey
            .iter()
            .map(|(name, c)| format!("{}:{}", name, c.surviving))
            .collect();
        format!(
            "Trial:{:3} | Gen:{:4} | Prey:{:6} | Hungry:{:4} | {}",
            self.trial,
            self.generation,
            self.prey_total(),
            self.hungry_total(),
            species.join(" ")
        )
    }
}

fn prey_counts(prey: &PreyPool) -> BTreeMap<String, PreyCounts> {
    prey.iter()
        .map(|(name, p)| {
            let counts = PreyCounts {
                surviving: p.population(),
                original: p.original_population(),
            };
            (name.to_string(), counts)
        })
        .collect()
}

fn predator_counts(
    predators: &PredatorPool,
    with_traces: bool,
) -> BTreeMap<String, PredatorCounts> {
    predators
        .iter()
        .map(|(name, species)| {
            let traces = if with_traces {
                species
                    .individuals()
                    .iter()
                    .enumerate()
                    .map(|(index, pred)| PredatorTrace {
                        index,
                        eaten: pred.eaten(),
                        experiences: pred
                            .histories()
                            .map(|(phen, h)| (phen.to_string(), h.to_vec()))
                            .collect(),
                        preferences: pred
                            .histories()
                            .map(|(phen, _)| (phen.to_string(), pred.preference(phen)))
                            .collect(),
                    })
                    .collect()
            } else {
                Vec::new()
            };
            let counts = PredatorCounts {
                population: species.population(),
                hungry: species.hungry_count(),
                traces,
            };
            (name.to_string(), counts)
        })
        .collect()
}

/// Historical snapshot tracker
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsHistory {
    /// Title of the simulation the snapshots came from
    pub title: String,
    /// All recorded snapshots, in emission order
    pub snapshots: Vec<GenerationSnapshot>,
    /// Keep per-individual predator traces
    #[serde(default)]
    pub with_traces: bool,
}

impl StatsHistory {
    pub fn new(title: impl Into<String>, with_traces: bool) -> Self {
        Self {
            title: title.into(),
            snapshots: Vec::new(),
            with_traces,
        }
    }

    /// Record a snapshot
    pub fn record(&mut self, snapshot: GenerationSnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Number of distinct trials seen
    pub fn trial_count(&self) -> usize {
        let mut trials: Vec<u32> = self.snapshots.iter().map(|s| s.trial).collect();
        trials.dedup();
        trials.len()
    }

    /// Surviving population of one species over time: (trial, generation, count)
    pub fn population_series(&self, species: &str) -> Vec<(u32, u32, u32)> {
        self.snapshots
            .iter()
            .filter_map(|s| {
                s.prey
                    .get(species)
                    .map(|c| (s.trial, s.generation, c.surviving))
            })
            .collect()
    }

    /// Last snapshot of each trial
    pub fn final_snapshots(&self) -> Vec<&GenerationSnapshot> {
        let mut finals: Vec<&GenerationSnapshot> = Vec::new();
        for snapshot in &self.snapshots {
            match finals.last_mut() {
                Some(last) if last.trial == snapshot.trial => *last = snapshot,
                _ => finals.push(snapshot),
            }
        }
        finals
    }

    /// Mean surviving population per prey species over the final
    /// generation of every trial
    pub fn mean_final_populations(&self) -> BTreeMap<String, f64> {
        let finals = self.final_snapshots();
        let mut sums: BTreeMap<String, f64> = BTreeMap::new();
        for snapshot in &finals {
            for (name, counts) in &snapshot.prey {
                *sums.entry(name.clone()).or_insert(0.0) += counts.surviving as f64;
            }
        }
        let n = finals.len().max(1) as f64;
        sums.into_iter().map(|(name, sum)| (name, sum / n)).collect()
    }

    /// Save history to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load history from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecology::{Limit, PredatorSpecies, PredatorTraits, PreySpecies};

    fn snapshot(trial: u32, generation: u32, a: u32, b: u32) -> GenerationSnapshot {
        let mut s = GenerationSnapshot {
            trial,
            generation,
            ..Default::default()
        };
        s.prey.insert("a".into(), PreyCounts { surviving: a, original: 10 });
        s.prey.insert("b".into(), PreyCounts { surviving: b, original: 10 });
        s
    }

    fn record() -> GenerationRecord {
        let mut prey = PreyPool::new();
        prey.add("moth", PreySpecies::new("M", 8, 1.0, 0.0, 0.5).unwrap()).unwrap();
        let traits = PredatorTraits {
            appetite: Limit::Bounded(1),
            ..Default::default()
        };
        let mut species = PredatorSpecies::with_prey(2, traits, &prey);
        let pred = species.individual_mut(1).unwrap();
        pred.remember("M", 0.5, Limit::Unbounded);
        pred.add_eaten(1.0);

        let mut predators = PredatorPool::new();
        predators.add("bird", species).unwrap();
        GenerationRecord {
            trial: 2,
            generation: 3,
            prey,
            predators,
        }
    }

    #[test]
    fn test_snapshot_from_record() {
        let snap = GenerationSnapshot::from_record(&record(), false);
        assert_eq!(snap.trial, 2);
        assert_eq!(snap.generation, 3);
        assert_eq!(snap.prey["moth"], PreyCounts { surviving: 8, original: 8 });
        assert_eq!(snap.predators["bird"].population, 2);
        assert_eq!(snap.predators["bird"].hungry, 1);
        assert!(snap.predators["bird"].traces.is_empty());
    }

    #[test]
    fn test_snapshot_traces() {
        let snap = GenerationSnapshot::from_record(&record(), true);
        let traces = &snap.predators["bird"].traces;
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0].preferences["M"], 1.0);
        assert_eq!(traces[1].experiences["M"], vec![0.5]);
        assert!((traces[1].preferences["M"] - 0.5).abs() < 1e-12);
        assert_eq!(traces[1].eaten, 1.0);
    }

    #[test]
    fn test_history_series_and_finals() {
        let mut history = StatsHistory::new("test", false);
        history.record(snapshot(1, 1, 10, 10));
        history.record(snapshot(1, 2, 6, 14));
        history.record(snapshot(2, 1, 9, 11));
        history.record(snapshot(2, 2, 4, 16));

        assert_eq!(history.trial_count(), 2);
        assert_eq!(
            history.population_series("a"),
            vec![(1, 1, 10), (1, 2, 6), (2, 1, 9), (2, 2, 4)]
        );

        let finals = history.final_snapshots();
        assert_eq!(finals.len(), 2);
        assert_eq!(finals[1].generation, 2);

        let means = history.mean_final_populations();
        assert_eq!(means["a"], 5.0);
        assert_eq!(means["b"], 15.0);
    }

    #[test]
    fn test_summary() {
        let line = snapshot(1, 4, 3, 7).summary();
        assert!(line.contains("Prey:    10"));
        assert!(line.contains("a:3 b:7"));
    }

    #[test]
    fn test_history_json_roundtrip() {
        let mut history = StatsHistory::new("roundtrip", true);
        history.record(GenerationSnapshot::from_record(&record(), true));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        history.save(&path).unwrap();

        let loaded = StatsHistory::load(&path).unwrap();
        assert_eq!(loaded.title, "roundtrip");
        assert_eq!(loaded.snapshots, history.snapshots);
    }
}
