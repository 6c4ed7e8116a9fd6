//! Encounter resolution: whether a predator pursues and eats a prey item,
//! and how the experience feeds back into its preferences.

use super::predator::{Predator, PredatorTraits};
use super::prey::PreySpecies;
use rand::Rng;

/// Result of one predator meeting one prey item
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EncounterOutcome {
    /// Predator has reached its appetite; nothing was drawn or changed
    Satiated,
    /// Predator decided not to pursue
    Ignored { chance: f64 },
    /// Prey was eaten; the caller removes it from its species
    Eaten { chance: f64 },
}

impl EncounterOutcome {
    pub fn is_predation(&self) -> bool {
        matches!(self, Self::Eaten { .. })
    }
}

/// Preference for a phenotype given its experience window.
///
/// Unknown or untasted phenotypes score 1.0. Any experience of exactly 0.0
/// scores 0.0 while it stays in the window. Otherwise the score is the
/// geometric mean of the window with its most recent value counted twice.
pub fn preference(history: Option<&[f64]>) -> f64 {
    let experiences = match history {
        Some(h) if !h.is_empty() => h,
        _ => return 1.0,
    };

    if experiences.iter().any(|&x| x == 0.0) {
        return 0.0;
    }

    let last = experiences[experiences.len() - 1];
    let log_sum: f64 = experiences.iter().map(|x| x.ln()).sum::<f64>() + last.ln();
    (log_sum / (experiences.len() + 1) as f64).exp()
}

/// Probability that `predator` pursues `prey`: visibility times preference.
///
/// Both factors lie in `[0, 1]`, so no clamping is applied.
pub fn pursuit_chance(predator: &Predator, prey: &PreySpecies) -> f64 {
    (1.0 - prey.camouflage()) * predator.preference(prey.phenotype())
}

/// Record a successful hunt: remember the taste and fill the stomach.
pub fn eat(traits: &PredatorTraits, predator: &mut Predator, prey: &PreySpecies) {
    predator.remember(prey.phenotype(), prey.palatability(), traits.memory);
    predator.add_eaten(prey.size());
}

/// Resolve one encounter, drawing a single uniform number if the predator
/// is hungry.
///
/// `traits.insatiable` is not consulted. Scaling the pursuit chance by the
/// appetite still remaining would be the place to make it matter.
pub fn encounter<R: Rng + ?Sized>(
    traits: &PredatorTraits,
    predator: &mut Predator,
    prey: &PreySpecies,
    rng: &mut R,
) -> EncounterOutcome {
    if !traits.is_hungry(predator) {
        return EncounterOutcome::Satiated;
    }

    let chance = pursuit_chance(predator, prey);
    if chance >= rng.gen::<f64>() {
        eat(traits, predator, prey);
        EncounterOutcome::Eaten { chance }
    } else {
        EncounterOutcome::Ignored { chance }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecology::predator::Limit;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn geometric_mean(values: &[f64]) -> f64 {
        values.iter().product::<f64>().powf(1.0 / values.len() as f64)
    }

    fn unbounded() -> PredatorTraits {
        PredatorTraits::default()
    }

    #[test]
    fn test_preference_unknown_and_empty() {
        assert_eq!(preference(None), 1.0);
        assert_eq!(preference(Some(&[])), 1.0);
    }

    #[test]
    fn test_preference_duplicates_last() {
        let pref = preference(Some(&[0.8, 0.6, 0.4]));
        let expected = geometric_mean(&[0.8, 0.6, 0.4, 0.4]);
        assert!((pref - expected).abs() < 1e-12);

        // A single experience still gives the value itself
        assert!((preference(Some(&[0.3])) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_preference_zero_poisons_window() {
        assert_eq!(preference(Some(&[0.9, 0.0, 1.0])), 0.0);
        assert_eq!(preference(Some(&[0.0])), 0.0);
        assert!(preference(Some(&[1e-9, 1.0])) > 0.0);
    }

    #[test]
    fn test_zero_expires_from_memory() {
        let mut pred = Predator::new();
        let memory = Limit::Bounded(2);
        pred.remember("A", 0.0, memory);
        assert_eq!(pred.preference("A"), 0.0);

        pred.remember("A", 1.0, memory);
        assert_eq!(pred.preference("A"), 0.0);
        pred.remember("A", 1.0, memory);
        assert!((pred.preference("A") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_camouflaged_prey_never_eaten() {
        let prey = PreySpecies::new("A", 10, 1.0, 1.0, 1.0).unwrap();
        let mut pred = Predator::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..500 {
            let outcome = encounter(&unbounded(), &mut pred, &prey, &mut rng);
            assert_eq!(outcome, EncounterOutcome::Ignored { chance: 0.0 });
        }
        assert_eq!(pred.eaten(), 0.0);
    }

    #[test]
    fn test_visible_palatable_prey_always_eaten() {
        let prey = PreySpecies::new("A", 10, 2.0, 0.0, 1.0).unwrap();
        let mut pred = Predator::new();
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        for _ in 0..5 {
            let outcome = encounter(&unbounded(), &mut pred, &prey, &mut rng);
            assert!(outcome.is_predation());
        }
        assert_eq!(pred.eaten(), 10.0);
        assert_eq!(pred.history("A").unwrap(), &[1.0; 5]);
    }

    #[test]
    fn test_satiated_predator_does_nothing() {
        let traits = PredatorTraits {
            appetite: Limit::Bounded(2),
            ..Default::default()
        };
        let prey = PreySpecies::new("A", 10, 1.0, 0.0, 1.0).unwrap();
        let mut pred = Predator::new();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        while traits.is_hungry(&pred) {
            encounter(&traits, &mut pred, &prey, &mut rng);
        }
        let before = pred.clone();
        let mut untouched = rng.clone();

        for _ in 0..20 {
            assert_eq!(
                encounter(&traits, &mut pred, &prey, &mut rng),
                EncounterOutcome::Satiated
            );
        }
        assert_eq!(pred, before);
        // No randomness consumed either
        assert_eq!(rng.gen::<u64>(), untouched.gen::<u64>());
    }

    #[test]
    fn test_unpalatable_taste_stops_pursuit() {
        let bad = PreySpecies::new("A", 10, 1.0, 0.0, 0.0).unwrap();
        let mimic = PreySpecies::new("A", 10, 1.0, 0.0, 1.0).unwrap();
        let mut pred = Predator::new();
        let mut rng = ChaCha8Rng::seed_from_u64(12);

        assert!(encounter(&unbounded(), &mut pred, &bad, &mut rng).is_predation());
        for _ in 0..100 {
            assert!(!encounter(&unbounded(), &mut pred, &mimic, &mut rng).is_predation());
        }
    }

    #[test]
    fn test_eat_creates_unknown_phenotype() {
        let prey = PreySpecies::new("novel", 1, 0.5, 0.0, 0.7).unwrap();
        let mut pred = Predator::new();
        eat(&unbounded(), &mut pred, &prey);
        assert_eq!(pred.history("novel").unwrap(), &[0.7]);
        assert_eq!(pred.eaten(), 0.5);
    }

    proptest! {
        #[test]
        fn proptest_preference_in_unit_interval(
            history in proptest::collection::vec(0.0f64..=1.0, 0..20)
        ) {
            let pref = preference(Some(&history));
            prop_assert!((0.0..=1.0 + 1e-12).contains(&pref));
        }

        #[test]
        fn proptest_memory_bound_holds(
            tastes in proptest::collection::vec(0.0f64..=1.0, 1..40),
            mem in 1u32..10,
        ) {
            let mut pred = Predator::new();
            for t in &tastes {
                pred.remember("A", *t, Limit::Bounded(mem));
            }
            let history = pred.history("A").unwrap();
            let keep = tastes.len().min(mem as usize);
            prop_assert_eq!(history, &tastes[tastes.len() - keep..]);
        }
    }
}
