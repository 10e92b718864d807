use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use flocking_core::config::{IndexKind, SimConfig};
use flocking_core::simulation::Simulation;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const WARMUP_STEPS: usize = 10;
const BENCHMARK_STEPS: usize = 100;

#[derive(Parser)]
#[command(name = "flocking")]
#[command(version)]
#[command(about = "Boids and Vicsek flocking simulation CLI")]
struct Cli {
    /// Enable debug logging (per-step timings). RUST_LOG takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Boids,
    Vicsek,
}

impl ModelArg {
    fn default_config(self) -> SimConfig {
        match self {
            ModelArg::Boids => SimConfig::boids(),
            ModelArg::Vicsek => SimConfig::vicsek(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from a config file
    Run {
        /// Path to config file (JSON); missing fields take defaults
        #[arg(long)]
        config: PathBuf,

        /// Output directory for summary.json (optional)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Sample flock metrics every N steps
        #[arg(long, default_value_t = 10)]
        sample_every: usize,

        /// Steps at which to keep full agent snapshots (comma-separated)
        #[arg(long, value_delimiter = ',')]
        snapshot_steps: Vec<usize>,
    },
    /// Measure step throughput for both models and both index kinds
    Benchmark {
        /// Number of agents
        #[arg(long, default_value_t = 1000)]
        population: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Dump a default configuration to stdout
    DumpDefaultConfig {
        #[arg(long, value_enum, default_value = "boids")]
        model: ModelArg,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_benchmark(base: SimConfig, index: IndexKind) -> Result<()> {
    let config = SimConfig {
        spatial_index: index,
        steps: WARMUP_STEPS + BENCHMARK_STEPS,
        ..base
    };
    let model = config.model.kind();
    let population = config.population;
    let mut sim = Simulation::from_config(config).context("benchmark config rejected")?;

    for _ in 0..WARMUP_STEPS {
        sim.step()?;
    }

    let mut total_index = 0u64;
    let mut total_update = 0u64;
    let mut total_commit = 0u64;
    let mut total_time = 0u64;
    for _ in 0..BENCHMARK_STEPS {
        let timings = sim.step()?;
        total_index += timings.index_build_us;
        total_update += timings.update_us;
        total_commit += timings.commit_us;
        total_time += timings.total_us;
    }

    let avg_step_us = total_time as f64 / BENCHMARK_STEPS as f64;
    let steps_per_sec = 1_000_000.0 / avg_step_us.max(1.0);
    println!("--- {model} / {index:?}: {population} agents ---");
    println!("  Avg step:      {avg_step_us:.0} us ({steps_per_sec:.1} steps/sec)");
    println!(
        "  Breakdown:     index={:.0} us, update={:.0} us, commit={:.0} us",
        total_index as f64 / BENCHMARK_STEPS as f64,
        total_update as f64 / BENCHMARK_STEPS as f64,
        total_commit as f64 / BENCHMARK_STEPS as f64,
    );
    if let Some(metrics) = sim.metrics() {
        println!("  Polarization:  {:.3}", metrics.polarization);
    }
    println!();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::DumpDefaultConfig { model } => {
            let config = model.default_config();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Benchmark { population, seed } => {
            if cfg!(debug_assertions) {
                eprintln!("WARNING: running in debug mode. Results are not representative.");
                eprintln!("         Use: cargo run -p flocking-cli --release -- benchmark");
                eprintln!();
            }
            println!("Warmup: {WARMUP_STEPS} steps, Benchmark: {BENCHMARK_STEPS} steps");
            println!();
            for model in [ModelArg::Boids, ModelArg::Vicsek] {
                for index in [IndexKind::Linear, IndexKind::Rtree] {
                    let base = SimConfig {
                        population,
                        seed,
                        ..model.default_config()
                    };
                    run_benchmark(base, index)?;
                }
            }
        }
        Commands::Run {
            config,
            out,
            sample_every,
            snapshot_steps,
        } => {
            let file = File::open(&config)
                .with_context(|| format!("failed to open config file {}", config.display()))?;
            let reader = BufReader::new(file);
            let sim_config: SimConfig =
                serde_json::from_reader(reader).context("failed to parse config")?;
            sim_config.validate().context("config validation error")?;

            info!(path = %config.display(), steps = sim_config.steps, "loaded config");

            let mut sim =
                Simulation::from_config(sim_config).context("failed to set up simulation")?;
            let summary = sim
                .run_with_snapshots(sample_every, &snapshot_steps)
                .context("simulation run failed")?;

            if let Some(out_dir) = out {
                std::fs::create_dir_all(&out_dir).context("failed to create output directory")?;
                let summary_path = out_dir.join("summary.json");
                let file = File::create(&summary_path).context("failed to create summary file")?;
                serde_json::to_writer_pretty(file, &summary).context("failed to write summary")?;
                info!(path = %summary_path.display(), "summary written");
            } else {
                println!(
                    "Run complete. {} steps, final polarization {:.3}",
                    summary.steps, summary.final_polarization
                );
            }
        }
    }
    Ok(())
}
