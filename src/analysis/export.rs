//! Result sinks: where generation records go while a simulation runs.

use crate::error::Result;
use crate::generation::GenerationRecord;
use crate::simulation::Simulation;
use crate::stats::{GenerationSnapshot, StatsHistory};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Consumer of generation records
pub trait ResultSink {
    /// Called once before the first record
    fn begin(&mut self, _sim: &Simulation) -> Result<()> {
        Ok(())
    }

    fn record(&mut self, record: &GenerationRecord) -> Result<()>;

    /// Called once after the last record
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: ResultSink + ?Sized> ResultSink for &mut S {
    fn begin(&mut self, sim: &Simulation) -> Result<()> {
        (**self).begin(sim)
    }

    fn record(&mut self, record: &GenerationRecord) -> Result<()> {
        (**self).record(record)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Feed the same records to two sinks
impl<A: ResultSink, B: ResultSink> ResultSink for (A, B) {
    fn begin(&mut self, sim: &Simulation) -> Result<()> {
        self.0.begin(sim)?;
        self.1.begin(sim)
    }

    fn record(&mut self, record: &GenerationRecord) -> Result<()> {
        self.0.record(record)?;
        self.1.record(record)
    }

    fn finish(&mut self) -> Result<()> {
        self.0.finish()?;
        self.1.finish()
    }
}

impl ResultSink for StatsHistory {
    fn begin(&mut self, sim: &Simulation) -> Result<()> {
        if self.title.is_empty() {
            self.title = sim.title().to_string();
        }
        Ok(())
    }

    fn record(&mut self, record: &GenerationRecord) -> Result<()> {
        let snapshot = GenerationSnapshot::from_record(record, self.with_traces);
        StatsHistory::record(self, snapshot);
        Ok(())
    }
}

/// Population table: one row per record, one column per prey species.
///
/// Verbose tables start with `trial,generation`; constant extra columns
/// are appended to every row.
pub struct CsvSink<W: Write> {
    writer: W,
    verbose: bool,
    extra_columns: BTreeMap<String, String>,
    species: Vec<String>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W, verbose: bool) -> Self {
        Self {
            writer,
            verbose,
            extra_columns: BTreeMap::new(),
            species: Vec::new(),
        }
    }

    pub fn with_extra_columns(mut self, extra_columns: BTreeMap<String, String>) -> Self {
        self.extra_columns = extra_columns;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl CsvSink<BufWriter<File>> {
    /// Write to a new file at `path`
    pub fn create<P: AsRef<Path>>(path: P, verbose: bool) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), verbose))
    }
}

impl<W: Write> ResultSink for CsvSink<W> {
    fn begin(&mut self, sim: &Simulation) -> Result<()> {
        self.species = sim.prey().names().into_iter().map(String::from).collect();

        let mut header: Vec<String> = Vec::new();
        if self.verbose {
            header.push("trial".to_string());
            header.push("generation".to_string());
        }
        header.extend(self.species.iter().map(|s| format!("{} popu", s)));
        header.extend(self.extra_columns.keys().cloned());

        write_row(&mut self.writer, &header)?;
        Ok(())
    }

    fn record(&mut self, record: &GenerationRecord) -> Result<()> {
        let mut row: Vec<String> = Vec::new();
        if self.verbose {
            row.push(record.trial.to_string());
            row.push(record.generation.to_string());
        }
        for name in &self.species {
            let popu = record.prey.get(name).map_or(0, |p| p.population());
            row.push(popu.to_string());
        }
        row.extend(self.extra_columns.values().cloned());

        write_row(&mut self.writer, &row)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

fn write_row<W: Write>(writer: &mut W, fields: &[String]) -> std::io::Result<()> {
    let line: Vec<String> = fields.iter().map(|f| escape(f)).collect();
    writeln!(writer, "{}", line.join(","))
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Export helpers for collected histories
pub struct ExportSystem;

impl ExportSystem {
    /// Export per-individual predator traces to CSV, one row per known
    /// phenotype of each individual. Experiences are `;`-separated.
    pub fn export_traces_csv<P: AsRef<Path>>(history: &StatsHistory, path: P) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);

        writeln!(
            file,
            "trial,generation,species,individual,eaten,phenotype,preference,experiences"
        )?;

        for snapshot in &history.snapshots {
            for (species, counts) in &snapshot.predators {
                for trace in &counts.traces {
                    for (phenotype, experiences) in &trace.experiences {
                        let preference = trace.preferences.get(phenotype).copied().unwrap_or(1.0);
                        let experiences: Vec<String> =
                            experiences.iter().map(|e| e.to_string()).collect();
                        let row = [
                            snapshot.trial.to_string(),
                            snapshot.generation.to_string(),
                            species.clone(),
                            trace.index.to_string(),
                            format!("{:.4}", trace.eaten),
                            phenotype.clone(),
                            format!("{:.6}", preference),
                            experiences.join(";"),
                        ];
                        write_row(&mut file, &row)?;
                    }
                }
            }
        }

        file.flush()?;
        Ok(())
    }

    /// Export the mean final population of each prey species to CSV
    pub fn export_summary_csv<P: AsRef<Path>>(history: &StatsHistory, path: P) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        writeln!(file, "species,mean_final_popu")?;
        for (species, mean) in history.mean_final_populations() {
            write_row(&mut file, &[species, format!("{:.2}", mean)])?;
        }
        file.flush()?;
        Ok(())
    }
}
