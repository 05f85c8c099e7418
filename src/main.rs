//! evonet - CLI entry point
//!
//! Evolves networks on the XOR task to exercise the library end to end.

use clap::{Parser, Subcommand};
use evonet::{Config, Hooks, Population};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "evonet")]
#[command(version)]
#[command(about = "Evolve topologically-mutable neural networks with a genetic algorithm")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve a population on XOR
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of generations
        #[arg(short, long, default_value = "100")]
        generations: u64,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

const XOR_CASES: [([f64; 2], f64); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            generations,
            seed,
            quiet,
        } => run_xor(config, generations, seed, quiet),

        Commands::Init { output } => generate_config(output),
    }
}

fn run_xor(
    config_path: PathBuf,
    generations: u64,
    seed: Option<u64>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = if config_path.exists() {
        println!("Loading config from: {:?}", config_path);
        Config::from_file(&config_path)?
    } else {
        println!("Using default configuration");
        Config::default()
    };
    config.network.inputs = 2;
    config.network.outputs = 1;
    config.validate()?;

    // The reward hook needs the expected answer of the case being presented
    let case = Rc::new(RefCell::new(0usize));
    let reward_case = Rc::clone(&case);
    let hooks = Hooks::reward_only(move |_, output| {
        let expected = XOR_CASES[*reward_case.borrow()].1;
        1.0 - (output[0] - expected).abs() * 2.0
    });

    let seed = seed.unwrap_or_else(rand::random);
    println!("Using seed: {}", seed);
    let mut population = Population::with_seed(config, hooks, seed)?;
    population.start(false)?;

    let start = Instant::now();
    for generation in 0..generations {
        for (i, (inputs, _)) in XOR_CASES.iter().enumerate() {
            *case.borrow_mut() = i;
            population.input(|_| inputs.to_vec())?;
        }

        if !quiet {
            if let Some((index, best)) = population.best() {
                println!(
                    "generation {:>4}: best #{} score {:.3} ({} hidden, {} synapses)",
                    generation,
                    index,
                    best.score(),
                    best.complexity(),
                    best.synapse_count()
                );
            }
        }
        population.evolve(false)?;
    }

    // Score the final generation once more so `best` reflects it
    for (i, (inputs, _)) in XOR_CASES.iter().enumerate() {
        *case.borrow_mut() = i;
        population.input(|_| inputs.to_vec())?;
    }

    println!();
    println!("=== Evolution Complete ===");
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());
    println!("Generations: {}", population.generation());

    if let Some((index, best)) = population.best() {
        println!("Best network: #{} score {:.3}", index, best.score());
        println!("Layers: {:?}", best.layer_sizes());
        for (inputs, expected) in XOR_CASES.iter() {
            let output = best.evaluate(inputs)?;
            println!("  {:?} -> {:.3} (expected {})", inputs, output[0], expected);
        }
    }

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
