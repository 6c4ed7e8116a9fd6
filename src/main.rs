//! MIMICRY - CLI Entry Point
//!
//! Predator-prey mimicry simulator.

use clap::{Parser, Subcommand};
use mimicry::analysis::{inspect, CsvSink, ExportSystem, ResultSink};
use mimicry::generation::GenerationRecord;
use mimicry::stats::{GenerationSnapshot, StatsHistory};
use mimicry::{benchmark, Config};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "mimicry")]
#[command(version)]
#[command(about = "Stochastic predator-prey simulator for the evolution of mimicry")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one or more simulations
    Run {
        /// Configuration files (YAML), run in order
        #[arg(default_value = "config.yaml")]
        configs: Vec<PathBuf>,

        /// Output directory for results
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility (overrides the config)
        #[arg(long)]
        seed: Option<u64>,

        /// Record every generation
        #[arg(short, long, conflicts_with = "terse")]
        verbose: bool,

        /// Record only the last generation of each trial
        #[arg(short, long)]
        terse: bool,

        /// Write per-individual predator traces
        #[arg(long)]
        traces: bool,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run a single generation and report what the predators learned
    Inspect {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run performance benchmark
    Benchmark {
        /// Encounters per generation
        #[arg(short, long, default_value = "10000")]
        encounters: u32,

        /// Population of each prey species
        #[arg(short, long, default_value = "1000")]
        population: u32,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            configs,
            output,
            seed,
            verbose,
            terse,
            traces,
            quiet,
        } => {
            let loaded = configs
                .iter()
                .map(|path| load_config(path))
                .collect::<Result<Vec<_>, _>>()?;
            init_logging(loaded.first().map(|c| c.logging.log_level.as_str()));

            let mode = RunMode {
                seed,
                verbose: if terse { Some(false) } else if verbose { Some(true) } else { None },
                traces,
                quiet,
            };
            for config in &loaded {
                run_simulation(config, &output, &mode)?;
            }
            Ok(())
        }

        Commands::Inspect { config, seed } => {
            let config = load_config(&config)?;
            init_logging(Some(&config.logging.log_level));
            inspect_predators(&config, seed)
        }

        Commands::Benchmark {
            encounters,
            population,
        } => {
            init_logging(None);
            run_benchmark(encounters, population)
        }

        Commands::Init { output } => {
            init_logging(None);
            generate_config(output)
        }
    }
}

fn init_logging(level: Option<&str>) {
    let env = env_logger::Env::default().default_filter_or(level.unwrap_or("info"));
    env_logger::Builder::from_env(env).init();
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        println!("Loading config from: {:?}", path);
        Ok(Config::from_file(path)?)
    } else {
        println!("Config {:?} not found, using default configuration", path);
        Ok(Config::default())
    }
}

/// Command-line overrides for a run
struct RunMode {
    seed: Option<u64>,
    verbose: Option<bool>,
    traces: bool,
    quiet: bool,
}

/// Prints a one-line summary every `interval` records
struct SummaryPrinter {
    interval: u32,
    seen: u32,
    quiet: bool,
}

impl ResultSink for SummaryPrinter {
    fn record(&mut self, record: &GenerationRecord) -> mimicry::Result<()> {
        self.seen += 1;
        if !self.quiet && (self.seen - 1) % self.interval == 0 {
            println!("{}", GenerationSnapshot::from_record(record, false).summary());
        }
        Ok(())
    }
}

fn resolve_seed(cli_seed: Option<u64>, config_seed: Option<u64>) -> u64 {
    cli_seed.or(config_seed).unwrap_or_else(|| {
        let seed = rand::thread_rng().gen();
        log::info!("No seed given, drew {}", seed);
        seed
    })
}

fn run_simulation(
    config: &Config,
    output: &Path,
    mode: &RunMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let sim = config.to_simulation()?;
    let verbose = mode.verbose.unwrap_or(config.output.verbose);
    let traces = mode.traces || config.output.traces;
    let seed = resolve_seed(mode.seed, config.simulation.seed);

    std::fs::create_dir_all(output)?;

    println!("Starting simulation {}", sim);
    println!("  Prey: {}", sim.prey());
    println!("  Predators: {}", sim.predators());
    println!(
        "  Trials: {}  Generations: {}  Encounters: {}",
        sim.repetitions(),
        sim.generations(),
        sim.encounters()
    );
    println!("  Seed: {}", seed);
    println!();

    // Description of exactly what was run, seed included
    let mut description = Config::from_simulation(&sim);
    description.simulation.seed = Some(seed);
    description.output = config.output.clone();
    description.output.verbose = verbose;
    description.output.traces = traces;
    description.logging = config.logging.clone();
    let desc_path = output.join(format!("{}.config.yaml", sim.title()));
    description.save(&desc_path)?;

    let csv_path = output.join(format!("{}.csv", sim.title()));
    let csv = CsvSink::create(&csv_path, verbose)?
        .with_extra_columns(config.output.extra_columns.clone());
    let mut history = StatsHistory::new(sim.title(), traces);
    let printer = SummaryPrinter {
        interval: config.logging.summary_interval.max(1),
        seen: 0,
        quiet: mode.quiet,
    };

    let start = Instant::now();
    let mut sinks = (csv, (&mut history, printer));
    let written = sim.run(verbose, ChaCha8Rng::seed_from_u64(seed), &mut sinks)?;
    let elapsed = start.elapsed();

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Records: {}", written);
    for (species, mean) in history.mean_final_populations() {
        println!("Mean final population of {}: {:.2}", species, mean);
    }
    let summary_path = output.join(format!("{}.summary.csv", sim.title()));
    ExportSystem::export_summary_csv(&history, &summary_path)?;

    println!("Results: {:?}", csv_path);
    println!("Summary: {:?}", summary_path);
    println!("Description: {:?}", desc_path);

    if config.output.json {
        let json_path = output.join(format!("{}.json", sim.title()));
        history.save(&json_path)?;
        println!("Stats history: {:?}", json_path);
    }
    if traces {
        let traces_path = output.join(format!("{}.traces.csv", sim.title()));
        ExportSystem::export_traces_csv(&history, &traces_path)?;
        println!("Predator traces: {:?}", traces_path);
    }

    Ok(())
}

fn inspect_predators(config: &Config, seed: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let sim = config.to_simulation()?;
    let seed = resolve_seed(seed, config.simulation.seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    println!("Inspecting {} with seed {}", sim, seed);
    println!();
    print!("{}", inspect(&sim, &mut rng));
    Ok(())
}

fn run_benchmark(encounters: u32, population: u32) -> Result<(), Box<dyn std::error::Error>> {
    println!("Running benchmark...");
    println!("  Encounters per generation: {}", encounters);
    println!("  Population per prey species: {}", population);
    println!();

    let result = benchmark(encounters, population)?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Default configuration saved to: {:?}", output);
    Ok(())
}
