//! Ecological model of the mimicry simulation.
//!
//! This module contains:
//! - Prey species and the prey pool (population-weighted selection, repopulation)
//! - Predator individuals, species and the predator pool (hunger-weighted selection)
//! - Encounter resolution (pursuit chance, learning, satiation)

pub mod encounter;
pub mod predator;
pub mod prey;

pub use encounter::{encounter, preference, pursuit_chance, EncounterOutcome};
pub use predator::{
    Limit, Predator, PredatorCount, PredatorPick, PredatorPool, PredatorSpecies, PredatorTraits,
};
pub use prey::{PreyCount, PreyPool, PreySpecies};
