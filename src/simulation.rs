//! Simulation: repeated independent trials over a fixed configuration.

use crate::analysis::export::ResultSink;
use crate::ecology::{PredatorPool, PreyPool};
use crate::error::{check_non_empty, Result, SimError};
use crate::generation::{GenerationRecord, Generations, Schedule};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::fmt;

/// A fully validated simulation description.
///
/// The pools held here are never mutated by a run; every trial starts from
/// its own copy.
#[derive(Clone, Debug, PartialEq)]
pub struct Simulation {
    title: String,
    prey: PreyPool,
    predators: PredatorPool,
    schedule: Schedule,
    repetitions: u32,
}

impl Simulation {
    /// Build a simulation. Every predator learns every phenotype present in
    /// `prey`, so first encounters start from an empty history.
    pub fn new(
        title: impl Into<String>,
        prey: PreyPool,
        mut predators: PredatorPool,
        schedule: Schedule,
        repetitions: u32,
    ) -> Result<Self> {
        let title = title.into();
        check_non_empty("title", &title)?;
        if schedule.generations == 0 {
            return Err(SimError::invalid("generations", "must be at least 1"));
        }
        if repetitions == 0 {
            return Err(SimError::invalid("repetitions", "must be at least 1"));
        }

        predators.learn_all(&prey);

        Ok(Self {
            title,
            prey,
            predators,
            schedule,
            repetitions,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn prey(&self) -> &PreyPool {
        &self.prey
    }

    pub fn predators(&self) -> &PredatorPool {
        &self.predators
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    pub fn encounters(&self) -> u32 {
        self.schedule.encounters
    }

    pub fn generations(&self) -> u32 {
        self.schedule.generations
    }

    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    pub fn repopulate(&self) -> bool {
        self.schedule.repopulate
    }

    /// Lazily run every trial.
    ///
    /// Verbose runs yield every generation of every trial; terse runs yield
    /// only the last generation of each trial. Dropping the iterator early
    /// simply leaves the remaining trials unrun.
    pub fn run_raw<R: Rng>(&self, verbose: bool, rng: R) -> RawRun<'_, R> {
        RawRun {
            sim: self,
            rng,
            verbose,
            next_trial: 1,
            cursor: None,
        }
    }

    /// [`run_raw`](Self::run_raw) with a ChaCha8 generator seeded from `seed`.
    pub fn run_seeded(&self, verbose: bool, seed: u64) -> RawRun<'_, ChaCha8Rng> {
        self.run_raw(verbose, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Drain a full run into `sink`, returning the number of records written.
    pub fn run<R: Rng, S: ResultSink + ?Sized>(
        &self,
        verbose: bool,
        rng: R,
        sink: &mut S,
    ) -> Result<usize> {
        log::info!(
            "Running \"{}\": {} trial(s) x {} generation(s), {} encounters each",
            self.title,
            self.repetitions,
            self.schedule.generations,
            self.schedule.encounters
        );

        sink.begin(self)?;
        let mut written = 0;
        for record in self.run_raw(verbose, rng) {
            sink.record(&record)?;
            written += 1;
        }
        sink.finish()?;

        log::info!("Finished \"{}\": {} record(s)", self.title, written);
        Ok(written)
    }
}

impl fmt::Display for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Simulation \"{}\">", self.title)
    }
}

/// Pull-based stream of generation records across all trials
pub struct RawRun<'a, R> {
    sim: &'a Simulation,
    rng: R,
    verbose: bool,
    next_trial: u32,
    cursor: Option<Generations>,
}

impl<R> RawRun<'_, R> {
    /// Trials started so far
    pub fn trials_started(&self) -> u32 {
        self.next_trial - 1
    }
}

impl<R: Rng> Iterator for RawRun<'_, R> {
    type Item = GenerationRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(cursor) = self.cursor.as_mut() {
                let record = if self.verbose {
                    cursor.advance(&mut self.rng)
                } else {
                    std::iter::from_fn(|| cursor.advance(&mut self.rng)).last()
                };

                if let (Some(rec), Some(tally)) = (record.as_ref(), cursor.last_tally()) {
                    log::debug!(
                        "Trial {} generation {}: {} encounter(s), {} kill(s)",
                        rec.trial,
                        rec.generation,
                        tally.encounters,
                        tally.kills
                    );
                }

                if cursor.is_finished() {
                    log::info!("Trial {} of {} complete", cursor.trial(), self.sim.repetitions);
                    self.cursor = None;
                }
                if record.is_some() {
                    return record;
                }
                continue;
            }

            if self.next_trial > self.sim.repetitions {
                return None;
            }
            self.cursor = Some(Generations::new(
                &self.sim.prey,
                &self.sim.predators,
                self.sim.schedule,
                self.next_trial,
            ));
            self.next_trial += 1;
        }
    }
}
