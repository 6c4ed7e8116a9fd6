//! Predator individuals, species and the name-ordered predator pool.

use super::encounter;
use super::prey::PreyPool;
use crate::error::{check_non_empty, Result, SimError};
use rand::Rng;
use std::collections::BTreeMap;
use std::fmt;

/// An appetite or memory cap that may be unbounded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Limit {
    Bounded(u32),
    #[default]
    Unbounded,
}

impl Limit {
    /// A finite limit. Zero is rejected: a predator that can eat or remember
    /// nothing is a configuration mistake.
    pub fn bounded(field: &'static str, value: u32) -> Result<Self> {
        if value == 0 {
            return Err(SimError::invalid(field, "must be positive"));
        }
        Ok(Self::Bounded(value))
    }

    /// `None` means unbounded.
    pub fn from_option(field: &'static str, value: Option<u32>) -> Result<Self> {
        match value {
            Some(v) => Self::bounded(field, v),
            None => Ok(Self::Unbounded),
        }
    }

    pub fn value(&self) -> Option<u32> {
        match self {
            Self::Bounded(v) => Some(*v),
            Self::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(v) => write!(f, "{}", v),
            Self::Unbounded => f.write_str("max"),
        }
    }
}

/// Which predators a count refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PredatorCount {
    #[default]
    All,
    /// Only individuals that have not reached their appetite
    Hungry,
}

/// One predator's learned state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Predator {
    /// Phenotype -> experiences (palatabilities tasted), oldest first
    prefs: BTreeMap<String, Vec<f64>>,
    /// Total size of prey eaten this generation
    eaten: f64,
}

impl Predator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eaten(&self) -> f64 {
        self.eaten
    }

    /// Experience window for a phenotype; `None` if it was never learned.
    pub fn history(&self, phenotype: &str) -> Option<&[f64]> {
        self.prefs.get(phenotype).map(Vec::as_slice)
    }

    /// Known phenotypes with their histories, sorted by phenotype
    pub fn histories(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.prefs.iter().map(|(p, h)| (p.as_str(), h.as_slice()))
    }

    /// Register a phenotype with an empty history, keeping any existing one.
    pub fn learn(&mut self, phenotype: &str) {
        if !self.prefs.contains_key(phenotype) {
            self.prefs.insert(phenotype.to_string(), Vec::new());
        }
    }

    /// Learn every phenotype present in a prey pool.
    pub fn learn_all(&mut self, prey: &PreyPool) {
        for phenotype in prey.phenotypes() {
            self.learn(phenotype);
        }
    }

    /// Append an experience and drop whatever no longer fits in `memory`.
    pub fn remember(&mut self, phenotype: &str, experience: f64, memory: Limit) {
        let history = self.prefs.entry(phenotype.to_string()).or_default();
        history.push(experience);
        if let Limit::Bounded(mem) = memory {
            let excess = history.len().saturating_sub(mem as usize);
            history.drain(..excess);
        }
    }

    pub(crate) fn add_eaten(&mut self, amount: f64) {
        self.eaten += amount;
    }

    /// Learned preference for a phenotype, in `[0, 1]`.
    pub fn preference(&self, phenotype: &str) -> f64 {
        encounter::preference(self.history(phenotype))
    }

    /// Highest preference over all known phenotypes (1.0 if none known).
    pub fn max_preference(&self) -> f64 {
        self.prefs
            .values()
            .map(|h| encounter::preference(Some(h)))
            .reduce(f64::max)
            .unwrap_or(1.0)
    }

    /// Clear every history (keeping the phenotypes) and the eaten counter.
    pub fn forget(&mut self) {
        for history in self.prefs.values_mut() {
            history.clear();
        }
        self.eaten = 0.0;
    }
}

/// Parameters shared by every individual of a predator species
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PredatorTraits {
    /// Cumulative prey size eaten before the predator stops hunting
    pub appetite: Limit,
    /// Experiences remembered per phenotype
    pub memory: Limit,
    /// Informational. Pursuit odds do not depend on it.
    pub insatiable: bool,
}

impl PredatorTraits {
    pub fn is_hungry(&self, predator: &Predator) -> bool {
        match self.appetite {
            Limit::Bounded(app) => predator.eaten < app as f64,
            Limit::Unbounded => true,
        }
    }
}

/// A species of predator: shared traits plus independent individuals
#[derive(Clone, Debug, PartialEq)]
pub struct PredatorSpecies {
    traits: PredatorTraits,
    individuals: Vec<Predator>,
}

impl PredatorSpecies {
    /// Create `population` naive individuals.
    pub fn new(population: u32, traits: PredatorTraits) -> Self {
        Self {
            traits,
            individuals: vec![Predator::new(); population as usize],
        }
    }

    /// Create individuals that already know every phenotype in `prey`.
    pub fn with_prey(population: u32, traits: PredatorTraits, prey: &PreyPool) -> Self {
        let mut template = Predator::new();
        template.learn_all(prey);
        Self {
            traits,
            individuals: vec![template; population as usize],
        }
    }

    pub fn traits(&self) -> PredatorTraits {
        self.traits
    }

    pub fn population(&self) -> usize {
        self.individuals.len()
    }

    pub fn individuals(&self) -> &[Predator] {
        &self.individuals
    }

    pub fn individual(&self, index: usize) -> Option<&Predator> {
        self.individuals.get(index)
    }

    pub fn individual_mut(&mut self, index: usize) -> Option<&mut Predator> {
        self.individuals.get_mut(index)
    }

    pub fn is_hungry(&self, index: usize) -> bool {
        self.individuals
            .get(index)
            .is_some_and(|p| self.traits.is_hungry(p))
    }

    pub fn hungry_count(&self) -> usize {
        self.individuals
            .iter()
            .filter(|p| self.traits.is_hungry(p))
            .count()
    }

    pub fn count(&self, mode: PredatorCount) -> usize {
        match mode {
            PredatorCount::All => self.population(),
            PredatorCount::Hungry => self.hungry_count(),
        }
    }

    pub fn learn_all(&mut self, prey: &PreyPool) {
        for predator in &mut self.individuals {
            predator.learn_all(prey);
        }
    }

    /// Return every individual to a naive, empty-stomached state.
    pub fn reset(&mut self) {
        for predator in &mut self.individuals {
            predator.forget();
        }
    }

    /// Index into `individuals` of the `nth` individual counted under `mode`.
    fn nth_index(&self, nth: usize, mode: PredatorCount) -> Option<usize> {
        match mode {
            PredatorCount::All => (nth < self.individuals.len()).then_some(nth),
            PredatorCount::Hungry => self
                .individuals
                .iter()
                .enumerate()
                .filter(|(_, p)| self.traits.is_hungry(p))
                .nth(nth)
                .map(|(i, _)| i),
        }
    }
}

impl fmt::Display for PredatorSpecies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "popu={}; app={}; mem={}; insatiable={}",
            self.population(),
            self.traits.appetite,
            self.traits.memory,
            self.traits.insatiable
        )
    }
}

/// A predator chosen for an encounter
#[derive(Debug)]
pub struct PredatorPick<'a> {
    pub species: &'a str,
    pub index: usize,
    pub traits: PredatorTraits,
    pub predator: &'a mut Predator,
}

/// All predator species of one ecosystem, keyed and iterated by species name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PredatorPool {
    species: BTreeMap<String, PredatorSpecies>,
}

impl PredatorPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.species.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PredatorSpecies)> {
        self.species.iter().map(|(name, s)| (name.as_str(), s))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.species.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&PredatorSpecies> {
        self.species
            .get(name)
            .ok_or_else(|| SimError::SpeciesNotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut PredatorSpecies> {
        self.species
            .get_mut(name)
            .ok_or_else(|| SimError::SpeciesNotFound(name.to_string()))
    }

    pub fn add(&mut self, name: impl Into<String>, species: PredatorSpecies) -> Result<()> {
        let name = name.into();
        check_non_empty("species name", &name)?;
        if self.species.contains_key(&name) {
            return Err(SimError::DuplicateSpecies(name));
        }
        self.species.insert(name, species);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<PredatorSpecies> {
        self.species
            .remove(name)
            .ok_or_else(|| SimError::SpeciesNotFound(name.to_string()))
    }

    /// Replace an existing species. With `force`, a missing name is simply added.
    pub fn replace(
        &mut self,
        name: impl Into<String>,
        species: PredatorSpecies,
        force: bool,
    ) -> Result<()> {
        let name = name.into();
        if !force && !self.species.contains_key(&name) {
            return Err(SimError::SpeciesNotFound(name));
        }
        self.species.remove(&name);
        self.add(name, species)
    }

    pub fn clear(&mut self) {
        self.species.clear();
    }

    /// Total predators under `mode`
    pub fn population(&self, mode: PredatorCount) -> usize {
        self.species.values().map(|s| s.count(mode)).sum()
    }

    pub fn population_of(&self, name: &str, mode: PredatorCount) -> Result<usize> {
        Ok(self.get(name)?.count(mode))
    }

    /// Give every individual an empty history for each phenotype in `prey`.
    pub fn learn_all(&mut self, prey: &PreyPool) {
        for species in self.species.values_mut() {
            species.learn_all(prey);
        }
    }

    /// Reset every individual of every species.
    pub fn reset(&mut self) {
        for species in self.species.values_mut() {
            species.reset();
        }
    }

    /// Locate the species and individual index for a drawn position.
    /// Returns `None` without consuming randomness if nobody is eligible.
    fn locate<R: Rng + ?Sized>(&self, mode: PredatorCount, rng: &mut R) -> Option<(&str, usize)> {
        let available = self.population(mode);
        if available == 0 {
            return None;
        }
        let mut idx = rng.gen_range(0..available);
        for (name, species) in self.iter() {
            let count = species.count(mode);
            if idx < count {
                return species.nth_index(idx, mode).map(|i| (name, i));
            }
            idx -= count;
        }
        None
    }

    /// Pick a predator individual with probability proportional to species
    /// counts under `mode`. Returns the species name and individual index.
    pub fn select<R: Rng + ?Sized>(
        &self,
        mode: PredatorCount,
        rng: &mut R,
    ) -> Option<(&str, usize)> {
        self.locate(mode, rng)
    }

    /// Same draw as [`select`](Self::select), handing out the individual mutably.
    pub fn select_mut<R: Rng + ?Sized>(
        &mut self,
        mode: PredatorCount,
        rng: &mut R,
    ) -> Option<PredatorPick<'_>> {
        let (name, index) = self.locate(mode, rng)?;
        let name = name.to_string();
        let (species_name, species) = self.species.iter_mut().find(|(k, _)| **k == name)?;
        let traits = species.traits;
        let predator = species.individuals.get_mut(index)?;
        Some(PredatorPick {
            species: species_name,
            index,
            traits,
            predator,
        })
    }

    pub fn pretty_list(&self) -> Vec<String> {
        self.iter().map(|(name, s)| format!("{}: {}", name, s)).collect()
    }
}

impl fmt::Display for PredatorPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_list().join("/"))
    }
}
