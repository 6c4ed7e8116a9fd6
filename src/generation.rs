//! Generation loop: encounters within a generation, then repopulation of
//! prey and replacement of predators between generations.

use crate::ecology::{encounter, PredatorCount, PredatorPool, PreyCount, PreyPool};
use rand::Rng;

/// How many encounters and generations a trial runs, and when prey are
/// repopulated relative to recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    /// Encounter budget per generation
    pub encounters: u32,
    /// Generations per trial
    pub generations: u32,
    /// Record after repopulating (and emit a generation 0) instead of before
    pub repopulate: bool,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            encounters: 1,
            generations: 1,
            repopulate: false,
        }
    }
}

/// Why a generation stopped before using its encounter budget
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EarlyEnd {
    PreyExtinct,
    PredatorsSated,
}

/// What happened during one generation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationTally {
    /// Encounters actually resolved
    pub encounters: u32,
    /// Encounters that ended with the prey eaten
    pub kills: u32,
    pub early_end: Option<EarlyEnd>,
}

/// Ecosystem state recorded for one generation of one trial
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRecord {
    pub trial: u32,
    pub generation: u32,
    pub prey: PreyPool,
    pub predators: PredatorPool,
}

/// Run up to `encounters` encounters in place.
///
/// Each cycle checks for extinction and satiation, then draws a surviving
/// prey item, then a hungry predator, then resolves the pursuit. This draw
/// order is part of the reproducibility contract.
pub fn run_generation<R: Rng + ?Sized>(
    prey: &mut PreyPool,
    predators: &mut PredatorPool,
    encounters: u32,
    rng: &mut R,
) -> GenerationTally {
    let mut tally = GenerationTally::default();

    for _ in 0..encounters {
        if prey.population(PreyCount::Surviving) == 0 {
            tally.early_end = Some(EarlyEnd::PreyExtinct);
            break;
        }
        if predators.population(PredatorCount::Hungry) == 0 {
            tally.early_end = Some(EarlyEnd::PredatorsSated);
            break;
        }

        let Some((_, prey_item)) = prey.select_mut(rng) else {
            break;
        };
        let Some(pick) = predators.select_mut(PredatorCount::Hungry, rng) else {
            break;
        };

        let outcome = encounter(&pick.traits, pick.predator, prey_item, rng);
        tally.encounters += 1;
        // The selected species always has a survivor to remove
        if outcome.is_predation() && prey_item.remove_one().is_ok() {
            tally.kills += 1;
        }
    }

    if let Some(reason) = tally.early_end {
        log::trace!(
            "Generation ended after {} of {} encounters: {:?}",
            tally.encounters,
            encounters,
            reason
        );
    }

    tally
}

/// Run a single generation on copies of the given pools.
pub fn one_gen<R: Rng + ?Sized>(
    prey_in: &PreyPool,
    predators_in: &PredatorPool,
    encounters: u32,
    rng: &mut R,
) -> (PreyPool, PredatorPool) {
    let mut prey = prey_in.clone();
    let mut predators = predators_in.clone();
    run_generation(&mut prey, &mut predators, encounters, rng);
    (prey, predators)
}

/// Step-by-step state of one trial.
///
/// Holds its own copies of the pools, so advancing it never touches the
/// configuration it was built from. Randomness is passed per step.
#[derive(Clone, Debug)]
pub struct Generations {
    schedule: Schedule,
    trial: u32,
    prey: PreyPool,
    predators: PredatorPool,
    /// Naive predators every generation starts from
    template: PredatorPool,
    next_generation: u32,
    started: bool,
    last_tally: Option<GenerationTally>,
}

impl Generations {
    pub fn new(prey: &PreyPool, predators: &PredatorPool, schedule: Schedule, trial: u32) -> Self {
        Self {
            schedule,
            trial,
            prey: prey.clone(),
            predators: predators.clone(),
            template: predators.clone(),
            next_generation: 1,
            started: false,
            last_tally: None,
        }
    }

    pub fn trial(&self) -> u32 {
        self.trial
    }

    /// Tally of the most recently simulated generation
    pub fn last_tally(&self) -> Option<GenerationTally> {
        self.last_tally
    }

    pub fn is_finished(&self) -> bool {
        self.started && self.next_generation > self.schedule.generations
    }

    fn record(&self, generation: u32, prey: PreyPool, predators: PredatorPool) -> GenerationRecord {
        GenerationRecord {
            trial: self.trial,
            generation,
            prey,
            predators,
        }
    }

    /// Produce the next record, simulating a generation if needed.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<GenerationRecord> {
        if !self.started {
            self.started = true;
            if self.schedule.repopulate {
                return Some(self.record(0, self.prey.clone(), self.predators.clone()));
            }
        }
        if self.next_generation > self.schedule.generations {
            return None;
        }

        let generation = self.next_generation;
        self.next_generation += 1;

        let tally = run_generation(
            &mut self.prey,
            &mut self.predators,
            self.schedule.encounters,
            rng,
        );
        self.last_tally = Some(tally);

        if self.schedule.repopulate {
            self.prey.repopulate(None);
            self.predators = self.template.clone();
            Some(self.record(generation, self.prey.clone(), self.predators.clone()))
        } else {
            let prey = self.prey.clone();
            let predators = std::mem::replace(&mut self.predators, self.template.clone());
            self.prey.repopulate(None);
            Some(self.record(generation, prey, predators))
        }
    }
}

/// Iterator over every generation of a trial
pub struct AllGens<'r, R: ?Sized> {
    cursor: Generations,
    rng: &'r mut R,
}

impl<R: Rng + ?Sized> Iterator for AllGens<'_, R> {
    type Item = GenerationRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.advance(&mut *self.rng)
    }
}

/// Lazily run every generation of one trial, yielding each as it completes.
///
/// With `schedule.repopulate` the first item is generation 0, the untouched
/// starting state.
pub fn all_gens<'r, R: Rng + ?Sized>(
    prey_in: &PreyPool,
    predators_in: &PredatorPool,
    schedule: Schedule,
    rng: &'r mut R,
) -> AllGens<'r, R> {
    AllGens {
        cursor: Generations::new(prey_in, predators_in, schedule, 1),
        rng,
    }
}

/// Run every generation of one trial and return only the last one.
///
/// Identical to the final item of [`all_gens`] for the same random stream.
pub fn multi_gen<R: Rng + ?Sized>(
    prey_in: &PreyPool,
    predators_in: &PredatorPool,
    schedule: Schedule,
    rng: &mut R,
) -> Option<GenerationRecord> {
    all_gens(prey_in, predators_in, schedule, rng).last()
}
