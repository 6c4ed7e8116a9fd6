//! Prey species and the name-ordered prey pool.

use crate::error::{check_non_empty, check_unit, Result, SimError};
use rand::Rng;
use std::collections::BTreeMap;
use std::fmt;

/// Which population figure a prey count refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PreyCount {
    /// Individuals still alive this generation
    #[default]
    Surviving,
    /// Population the species was configured with
    Original,
}

/// One species of prey: its traits and its live count.
///
/// Species sharing a phenotype are indistinguishable to predators, which is
/// how mimicry is expressed.
#[derive(Clone, Debug, PartialEq)]
pub struct PreySpecies {
    phenotype: String,
    size: f64,
    camouflage: f64,
    palatability: f64,
    population: u32,
    original_population: u32,
}

impl PreySpecies {
    /// Create a prey species. `population` also becomes the repopulation baseline.
    pub fn new(
        phenotype: impl Into<String>,
        population: u32,
        size: f64,
        camouflage: f64,
        palatability: f64,
    ) -> Result<Self> {
        let phenotype = phenotype.into();
        check_non_empty("phenotype", &phenotype)?;
        check_size(size)?;
        check_unit("camouflage", camouflage)?;
        check_unit("palatability", palatability)?;

        Ok(Self {
            phenotype,
            size,
            camouflage,
            palatability,
            population,
            original_population: population,
        })
    }

    pub fn phenotype(&self) -> &str {
        &self.phenotype
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn camouflage(&self) -> f64 {
        self.camouflage
    }

    pub fn palatability(&self) -> f64 {
        self.palatability
    }

    /// Current (surviving) population
    pub fn population(&self) -> u32 {
        self.population
    }

    /// Population at construction time
    pub fn original_population(&self) -> u32 {
        self.original_population
    }

    /// Population under the given counting mode
    pub fn count(&self, mode: PreyCount) -> u32 {
        match mode {
            PreyCount::Surviving => self.population,
            PreyCount::Original => self.original_population,
        }
    }

    pub fn set_phenotype(&mut self, phenotype: impl Into<String>) -> Result<()> {
        let phenotype = phenotype.into();
        check_non_empty("phenotype", &phenotype)?;
        self.phenotype = phenotype;
        Ok(())
    }

    pub fn set_size(&mut self, size: f64) -> Result<()> {
        check_size(size)?;
        self.size = size;
        Ok(())
    }

    pub fn set_camouflage(&mut self, camouflage: f64) -> Result<()> {
        check_unit("camouflage", camouflage)?;
        self.camouflage = camouflage;
        Ok(())
    }

    pub fn set_palatability(&mut self, palatability: f64) -> Result<()> {
        check_unit("palatability", palatability)?;
        self.palatability = palatability;
        Ok(())
    }

    /// Overwrite the surviving population. The baseline is left untouched.
    pub fn set_population(&mut self, population: u32) {
        self.population = population;
    }

    /// Remove one eaten individual. Fails if none survive.
    pub fn remove_one(&mut self) -> Result<()> {
        if self.population == 0 {
            return Err(SimError::invalid("population", "no surviving individual to remove"));
        }
        self.population -= 1;
        Ok(())
    }

    /// Render the species, optionally including the original population.
    pub fn describe(&self, full: bool) -> String {
        let mut parts = vec![format!("popu={}", self.population)];
        if full {
            parts.push(format!("popu_orig={}", self.original_population));
        }
        parts.push(format!("phen={}", self.phenotype));
        parts.push(format!("size={}", self.size));
        parts.push(format!("camo={}", self.camouflage));
        parts.push(format!("pal={}", self.palatability));
        parts.join("; ")
    }
}

impl fmt::Display for PreySpecies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe(false))
    }
}

fn check_size(size: f64) -> Result<()> {
    if !size.is_finite() || size <= 0.0 {
        return Err(SimError::invalid(
            "size",
            format!("must be positive, got {}", size),
        ));
    }
    Ok(())
}

/// All prey species of one ecosystem, keyed and iterated by species name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreyPool {
    species: BTreeMap<String, PreySpecies>,
}

impl PreyPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Species names in iteration order
    pub fn names(&self) -> Vec<&str> {
        self.species.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PreySpecies)> {
        self.species.iter().map(|(name, prey)| (name.as_str(), prey))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut PreySpecies)> {
        self.species
            .iter_mut()
            .map(|(name, prey)| (name.as_str(), prey))
    }

    /// Distinct phenotypes present in the pool, sorted
    pub fn phenotypes(&self) -> Vec<&str> {
        let mut phenotypes: Vec<&str> = self.species.values().map(|p| p.phenotype()).collect();
        phenotypes.sort_unstable();
        phenotypes.dedup();
        phenotypes
    }

    pub fn contains(&self, name: &str) -> bool {
        self.species.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&PreySpecies> {
        self.species
            .get(name)
            .ok_or_else(|| SimError::SpeciesNotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut PreySpecies> {
        self.species
            .get_mut(name)
            .ok_or_else(|| SimError::SpeciesNotFound(name.to_string()))
    }

    /// Add a new species. Fails if the name is empty or already taken.
    pub fn add(&mut self, name: impl Into<String>, prey: PreySpecies) -> Result<()> {
        let name = name.into();
        check_non_empty("species name", &name)?;
        if self.species.contains_key(&name) {
            return Err(SimError::DuplicateSpecies(name));
        }
        self.species.insert(name, prey);
        Ok(())
    }

    /// Remove a species, returning it.
    pub fn remove(&mut self, name: &str) -> Result<PreySpecies> {
        self.species
            .remove(name)
            .ok_or_else(|| SimError::SpeciesNotFound(name.to_string()))
    }

    /// Replace an existing species. With `force`, a missing name is simply added.
    pub fn replace(
        &mut self,
        name: impl Into<String>,
        prey: PreySpecies,
        force: bool,
    ) -> Result<()> {
        let name = name.into();
        if !force && !self.species.contains_key(&name) {
            return Err(SimError::SpeciesNotFound(name));
        }
        self.species.remove(&name);
        self.add(name, prey)
    }

    pub fn clear(&mut self) {
        self.species.clear();
    }

    /// Total population over all species
    pub fn population(&self, mode: PreyCount) -> u64 {
        self.species.values().map(|p| p.count(mode) as u64).sum()
    }

    /// Population of a single species
    pub fn population_of(&self, name: &str, mode: PreyCount) -> Result<u32> {
        Ok(self.get(name)?.count(mode))
    }

    /// Draw the index of one individual, or `None` if the pool is empty
    /// under `mode`. No random number is consumed in the empty case.
    fn draw<R: Rng + ?Sized>(&self, mode: PreyCount, rng: &mut R) -> Option<u64> {
        let available = self.population(mode);
        if available == 0 {
            return None;
        }
        Some(rng.gen_range(0..available))
    }

    /// Pick a species with probability proportional to its population.
    pub fn select<R: Rng + ?Sized>(
        &self,
        mode: PreyCount,
        rng: &mut R,
    ) -> Option<(&str, &PreySpecies)> {
        let mut idx = self.draw(mode, rng)?;
        for (name, prey) in self.iter() {
            let count = prey.count(mode) as u64;
            if idx < count {
                return Some((name, prey));
            }
            idx -= count;
        }
        None
    }

    /// Same draw as `select(PreyCount::Surviving, ..)`, returning the species
    /// mutably. Always weighted by surviving individuals, so the species
    /// returned has at least one to remove.
    pub fn select_mut<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Option<(&str, &mut PreySpecies)> {
        let mut idx = self.draw(PreyCount::Surviving, rng)?;
        for (name, prey) in self.iter_mut() {
            let count = prey.population() as u64;
            if idx < count {
                return Some((name, prey));
            }
            idx -= count;
        }
        None
    }

    /// Rescale surviving populations so they sum to roughly `target`
    /// (default: the original total) while keeping their proportions.
    ///
    /// A pool with no survivors stays at zero. A species share above
    /// `u32::MAX` is clamped to `u32::MAX`.
    pub fn repopulate(&mut self, target: Option<u64>) {
        let target = target.unwrap_or_else(|| self.population(PreyCount::Original));
        let surviving = self.population(PreyCount::Surviving);

        if surviving == 0 {
            for prey in self.species.values_mut() {
                prey.set_population(0);
            }
            return;
        }

        for (name, prey) in self.species.iter_mut() {
            let share = prey.population() as f64 / surviving as f64 * target as f64;
            let rounded = share.round_ties_even();
            let population = u32::try_from(rounded as u64).unwrap_or_else(|_| {
                log::warn!("Repopulated {} clamped from {} to {}", name, rounded, u32::MAX);
                u32::MAX
            });
            prey.set_population(population);
        }
    }

    /// `name: species` strings in iteration order
    pub fn pretty_list(&self) -> Vec<String> {
        self.iter().map(|(name, prey)| format!("{}: {}", name, prey)).collect()
    }
}

impl fmt::Display for PreyPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_list().join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn prey(phen: &str, popu: u32) -> PreySpecies {
        PreySpecies::new(phen, popu, 1.0, 0.0, 1.0).unwrap()
    }

    fn pool(entries: &[(&str, u32)]) -> PreyPool {
        let mut pool = PreyPool::new();
        for (name, popu) in entries {
            pool.add(*name, prey(name, *popu)).unwrap();
        }
        pool
    }

    #[test]
    fn test_species_validation() {
        assert!(PreySpecies::new("", 10, 1.0, 0.0, 1.0).is_err());
        assert!(PreySpecies::new("A", 10, 0.0, 0.0, 1.0).is_err());
        assert!(PreySpecies::new("A", 10, -1.0, 0.0, 1.0).is_err());
        assert!(PreySpecies::new("A", 10, 1.0, 1.1, 1.0).is_err());
        assert!(PreySpecies::new("A", 10, 1.0, 0.5, -0.2).is_err());

        let mut p = prey("A", 10);
        assert!(p.set_camouflage(2.0).is_err());
        assert_eq!(p.camouflage(), 0.0);
    }

    #[test]
    fn test_names_sorted() {
        let pool = pool(&[("zebra", 1), ("alpha", 2), ("mid", 3)]);
        assert_eq!(pool.names(), vec!["alpha", "mid", "zebra"]);
    }

    #[test]
    fn test_add_remove_replace() {
        let mut pool = pool(&[("a", 1)]);

        assert!(matches!(
            pool.add("a", prey("A", 5)),
            Err(SimError::DuplicateSpecies(_))
        ));
        assert!(matches!(
            pool.replace("b", prey("B", 5), false),
            Err(SimError::SpeciesNotFound(_))
        ));

        pool.replace("b", prey("B", 5), true).unwrap();
        pool.replace("a", prey("A", 7), false).unwrap();
        assert_eq!(pool.get("a").unwrap().population(), 7);
        assert_eq!(pool.len(), 2);

        pool.remove("a").unwrap();
        assert!(pool.get("a").is_err());
        pool.clear();
        assert!(pool.is_empty());
    }

    #[test]
    fn test_population_modes() {
        let mut pool = pool(&[("a", 10), ("b", 5)]);
        pool.get_mut("a").unwrap().set_population(3);

        assert_eq!(pool.population(PreyCount::Surviving), 8);
        assert_eq!(pool.population(PreyCount::Original), 15);
        assert_eq!(pool.population_of("a", PreyCount::Original).unwrap(), 10);
        assert!(pool.population_of("missing", PreyCount::Surviving).is_err());
    }

    #[test]
    fn test_select_empty_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(PreyPool::new().select(PreyCount::Surviving, &mut rng).is_none());

        let extinct = pool(&[("a", 0), ("b", 0)]);
        for _ in 0..100 {
            assert!(extinct.select(PreyCount::Surviving, &mut rng).is_none());
        }
    }

    #[test]
    fn test_select_skips_zero_weight() {
        let pool = pool(&[("a", 0), ("b", 4), ("c", 0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..200 {
            let (name, _) = pool.select(PreyCount::Surviving, &mut rng).unwrap();
            assert_eq!(name, "b");
        }
    }

    #[test]
    fn test_select_frequencies() {
        let pool = pool(&[("a", 1), ("b", 3)]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let draws = 20_000;
        let hits_b = (0..draws)
            .filter(|_| pool.select(PreyCount::Surviving, &mut rng).unwrap().0 == "b")
            .count();

        let frac = hits_b as f64 / draws as f64;
        assert!((frac - 0.75).abs() < 0.02, "frac = {}", frac);
    }

    #[test]
    fn test_select_mut_matches_select() {
        let mut pool = pool(&[("a", 2), ("b", 3), ("c", 5)]);
        for seed in 0..50 {
            let mut rng1 = ChaCha8Rng::seed_from_u64(seed);
            let mut rng2 = ChaCha8Rng::seed_from_u64(seed);
            let name = pool
                .select(PreyCount::Surviving, &mut rng1)
                .map(|(n, _)| n.to_string());
            let name_mut = pool.select_mut(&mut rng2).map(|(n, _)| n.to_string());
            assert_eq!(name, name_mut);
        }
    }

    #[test]
    fn test_select_original_counts_extinct_species() {
        let mut pool = pool(&[("a", 10), ("b", 10)]);
        pool.get_mut("a").unwrap().set_population(0);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let hits_a = (0..2_000)
            .filter(|_| pool.select(PreyCount::Original, &mut rng).unwrap().0 == "a")
            .count();
        assert!(hits_a > 800 && hits_a < 1_200, "hits_a = {}", hits_a);

        for _ in 0..200 {
            let (name, prey) = pool.select_mut(&mut rng).unwrap();
            assert_eq!(name, "b");
            prey.remove_one().unwrap();
            prey.set_population(10);
        }
    }

    #[test]
    fn test_remove_one_from_extinct_species() {
        let mut p = prey("A", 1);
        p.remove_one().unwrap();
        assert_eq!(p.population(), 0);
        assert!(matches!(
            p.remove_one(),
            Err(SimError::InvalidParameter { field: "population", .. })
        ));
        assert_eq!(p.population(), 0);
    }

    #[test]
    fn test_repopulate_clamps_to_u32() {
        let mut pool = pool(&[("a", u32::MAX), ("b", u32::MAX)]);
        pool.get_mut("a").unwrap().set_population(0);

        pool.repopulate(None);
        assert_eq!(pool.get("a").unwrap().population(), 0);
        assert_eq!(pool.get("b").unwrap().population(), u32::MAX);
    }

    #[test]
    fn test_repopulate_scales() {
        let mut pool = pool(&[("a", 10), ("b", 10)]);
        pool.get_mut("a").unwrap().set_population(5);
        pool.get_mut("b").unwrap().set_population(15);

        pool.repopulate(None);
        assert_eq!(pool.get("a").unwrap().population(), 5);
        assert_eq!(pool.get("b").unwrap().population(), 15);

        pool.repopulate(Some(40));
        assert_eq!(pool.get("a").unwrap().population(), 10);
        assert_eq!(pool.get("b").unwrap().population(), 30);
    }

    #[test]
    fn test_repopulate_recovers_losses() {
        let mut pool = pool(&[("a", 10), ("b", 10)]);
        pool.get_mut("a").unwrap().set_population(2);
        pool.get_mut("b").unwrap().set_population(8);

        pool.repopulate(None);
        assert_eq!(pool.get("a").unwrap().population(), 4);
        assert_eq!(pool.get("b").unwrap().population(), 16);
    }

    #[test]
    fn test_repopulate_rounds_half_to_even() {
        // 1/4 * 10 = 2.5 -> 2, 3/4 * 10 = 7.5 -> 8
        let mut pool = pool(&[("a", 1), ("b", 3)]);
        pool.repopulate(Some(10));
        assert_eq!(pool.get("a").unwrap().population(), 2);
        assert_eq!(pool.get("b").unwrap().population(), 8);
    }

    #[test]
    fn test_repopulate_collapse_is_permanent() {
        let mut pool = pool(&[("a", 10), ("b", 10)]);
        pool.get_mut("a").unwrap().set_population(0);
        pool.get_mut("b").unwrap().set_population(0);

        pool.repopulate(None);
        pool.repopulate(Some(100));
        assert_eq!(pool.population(PreyCount::Surviving), 0);
    }

    #[test]
    fn test_display() {
        let pool = pool(&[("b", 2), ("a", 1)]);
        assert_eq!(
            pool.to_string(),
            "a: popu=1; phen=a; size=1; camo=0; pal=1/b: popu=2; phen=b; size=1; camo=0; pal=1"
        );
        assert!(pool.get("a").unwrap().describe(true).contains("popu_orig=1"));
    }

    proptest! {
        #[test]
        fn proptest_repopulate_without_losses_is_identity(
            counts in proptest::collection::vec(0u32..500, 1..6)
        ) {
            let mut pool = PreyPool::new();
            for (i, c) in counts.iter().enumerate() {
                pool.add(format!("s{}", i), prey("P", *c)).unwrap();
            }
            let before = pool.clone();

            pool.repopulate(None);
            prop_assert_eq!(pool, before);
        }

        #[test]
        fn proptest_select_only_returns_populated(
            counts in proptest::collection::vec(0u32..20, 1..6),
            seed in any::<u64>(),
        ) {
            let mut pool = PreyPool::new();
            for (i, c) in counts.iter().enumerate() {
                pool.add(format!("s{}", i), prey("P", *c)).unwrap();
            }
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            match pool.select(PreyCount::Surviving, &mut rng) {
                Some((_, species)) => prop_assert!(species.population() > 0),
                None => prop_assert_eq!(pool.population(PreyCount::Surviving), 0),
            }
        }
    }
}
