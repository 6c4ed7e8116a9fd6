//! Single-generation predator report: what each predator ended up
//! remembering and how much it now likes each phenotype.

use crate::generation::{run_generation, GenerationTally};
use crate::simulation::Simulation;
use rand::Rng;
use std::fmt;

/// One phenotype as seen by one predator
#[derive(Clone, Debug, PartialEq)]
pub struct PhenotypeView {
    pub phenotype: String,
    pub experiences: Vec<f64>,
    pub preference: f64,
}

/// One predator individual after the generation
#[derive(Clone, Debug, PartialEq)]
pub struct IndividualReport {
    pub species: String,
    pub index: usize,
    pub eaten: f64,
    /// Highest preference over every known phenotype
    pub max_preference: f64,
    pub phenotypes: Vec<PhenotypeView>,
}

/// Outcome of a single inspected generation
#[derive(Clone, Debug, PartialEq)]
pub struct InspectionReport {
    pub tally: GenerationTally,
    /// (species, remaining population), in species order
    pub prey_remaining: Vec<(String, u32)>,
    pub individuals: Vec<IndividualReport>,
}

/// Run one generation of `sim` and report every predator's learned state.
pub fn inspect<R: Rng + ?Sized>(sim: &Simulation, rng: &mut R) -> InspectionReport {
    let mut prey = sim.prey().clone();
    let mut predators = sim.predators().clone();
    let tally = run_generation(&mut prey, &mut predators, sim.encounters(), rng);

    let prey_remaining = prey
        .iter()
        .map(|(name, p)| (name.to_string(), p.population()))
        .collect();

    let individuals = predators
        .iter()
        .flat_map(|(species, s)| {
            s.individuals()
                .iter()
                .enumerate()
                .map(move |(index, pred)| IndividualReport {
                    species: species.to_string(),
                    index,
                    eaten: pred.eaten(),
                    max_preference: pred.max_preference(),
                    phenotypes: pred
                        .histories()
                        .map(|(phen, history)| PhenotypeView {
                            phenotype: phen.to_string(),
                            experiences: history.to_vec(),
                            preference: pred.preference(phen),
                        })
                        .collect(),
                })
        })
        .collect();

    InspectionReport {
        tally,
        prey_remaining,
        individuals,
    }
}

impl fmt::Display for InspectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Generation: {} encounter(s), {} kill(s) ===",
            self.tally.encounters, self.tally.kills
        )?;
        for (species, popu) in &self.prey_remaining {
            writeln!(f, "Remaining population of species {} is {}.", species, popu)?;
        }
        for ind in &self.individuals {
            writeln!(f)?;
            writeln!(
                f,
                "Individual {} of {} (ate {}, max preference {:.4}) has the following experiences:",
                ind.index, ind.species, ind.eaten, ind.max_preference
            )?;
            for view in &ind.phenotypes {
                writeln!(
                    f,
                    "  {}: {:?} giving a preference of {:.4}",
                    view.phenotype, view.experiences, view.preference
                )?;
            }
        }
        Ok(())
    }
}
