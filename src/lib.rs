//! # MIMICRY
//!
//! Stochastic predator-prey simulator for studying the evolution of mimicry.
//!
//! Prey species carry a phenotype, a size, a camouflage and a palatability.
//! Predators remember how palatable each phenotype tasted and pursue prey in
//! proportion to that memory, so a palatable species sharing the phenotype of
//! an unpalatable one is protected (Batesian mimicry), and two unpalatable
//! species sharing a phenotype protect each other (Müllerian mimicry).
//!
//! ## Features
//!
//! - **Reproducible**: Seeded ChaCha8 random number generation
//! - **Lazy**: Results stream out generation by generation
//! - **Configurable**: YAML configuration files
//!
//! ## Quick Start
//!
//! ```rust
//! use mimicry::Config;
//!
//! let sim = Config::default().to_simulation().unwrap();
//!
//! // Last generation of every trial
//! for record in sim.run_seeded(false, 42) {
//!     println!("trial {}: {}", record.trial, record.prey);
//! }
//! ```
//!
//! ## Building by hand
//!
//! ```rust
//! use mimicry::ecology::{
//!     Limit, PredatorPool, PredatorSpecies, PredatorTraits, PreyPool, PreySpecies,
//! };
//! use mimicry::{Schedule, Simulation};
//!
//! let mut prey = PreyPool::new();
//! prey.add("monarch", PreySpecies::new("orange", 50, 1.0, 0.2, 0.0).unwrap()).unwrap();
//! prey.add("viceroy", PreySpecies::new("orange", 50, 1.0, 0.2, 1.0).unwrap()).unwrap();
//!
//! let mut predators = PredatorPool::new();
//! let traits = PredatorTraits { appetite: Limit::Bounded(5), ..Default::default() };
//! predators.add("jay", PredatorSpecies::new(4, traits)).unwrap();
//!
//! let schedule = Schedule { encounters: 100, generations: 10, repopulate: true };
//! let sim = Simulation::new("butterflies", prey, predators, schedule, 3).unwrap();
//! assert_eq!(sim.run_seeded(true, 1).count(), 33);
//! ```

pub mod analysis;
pub mod config;
pub mod ecology;
pub mod error;
pub mod generation;
pub mod simulation;
pub mod stats;

// Re-export main types
pub use config::Config;
pub use error::{Result, SimError};
pub use generation::{all_gens, multi_gen, one_gen, GenerationRecord, Schedule};
pub use simulation::{RawRun, Simulation};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark: one trial of the default configuration with
/// `population` individuals per prey species.
pub fn benchmark(encounters: u32, population: u32) -> Result<BenchmarkResult> {
    use std::time::Instant;

    let mut config = Config::default();
    config.simulation.encounters = encounters;
    config.simulation.repetitions = 1;
    for prey in &mut config.prey {
        prey.population = population;
    }
    let sim = config.to_simulation()?;
    let initial_prey = sim.prey().population(ecology::PreyCount::Surviving);

    let start = Instant::now();
    let last = sim.run_seeded(true, 0).last();
    let elapsed = start.elapsed();

    let generations = sim.generations();
    let final_prey = last.map_or(0, |r| r.prey.population(ecology::PreyCount::Surviving));

    Ok(BenchmarkResult {
        encounters,
        generations,
        initial_prey,
        final_prey,
        elapsed_secs: elapsed.as_secs_f64(),
        generations_per_second: generations as f64 / elapsed.as_secs_f64(),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub encounters: u32,
    pub generations: u32,
    pub initial_prey: u64,
    pub final_prey: u64,
    pub elapsed_secs: f64,
    pub generations_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Encounters per generation: {}", self.encounters)?;
        writeln!(f, "Generations: {}", self.generations)?;
        writeln!(f, "Prey: {} -> {}", self.initial_prey, self.final_prey)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} generations/s", self.generations_per_second)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_quick_simulation() {
        let sim = Config::default().to_simulation().unwrap();
        let records: Vec<GenerationRecord> = sim.run_seeded(false, 1).collect();

        assert_eq!(records.len(), sim.repetitions() as usize);
        assert!(records.iter().all(|r| r.generation == sim.generations()));
    }

    #[test]
    fn test_benchmark() {
        let result = benchmark(50, 20).unwrap();

        assert_eq!(result.encounters, 50);
        assert_eq!(result.initial_prey, 60);
        assert!(result.generations_per_second > 0.0);
        assert!(result.to_string().contains("Prey: 60 ->"));
    }
}
