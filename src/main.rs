// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use accompanist::{KeySource, RunConfig, Session};
use anyhow::{anyhow, bail, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    println!("Accompanist - Evolutionary Melody Harmonizer");
    println!();
    println!("Usage: accompanist <INPUT.mid> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <FILE>         Load run settings from a YAML or TOML file");
    println!("  --population <N>        Initial population size (default 100)");
    println!("  --generations <N>       Number of generations (default 300)");
    println!("  --seed <N>              Random seed for a reproducible run");
    println!("  --key <\"TONIC MODE\">    Use this key instead of detecting one, e.g. \"A minor\"");
    println!("  --output <FILE>         Output file (default <input>-harmonized-<key>.mid)");
    println!("  --help                  Show this help message");
}

/// Parsed command line
#[derive(Debug, Default)]
struct Args {
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    population: Option<usize>,
    generations: Option<usize>,
    seed: Option<u64>,
    key: Option<String>,
    output: Option<String>,
    help: bool,
}

fn value_of<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{} requires a value", flag))
}

fn number_of<T: FromStr>(args: &[String], index: usize, flag: &str) -> Result<T> {
    let value = value_of(args, index, flag)?;
    value
        .parse()
        .map_err(|_| anyhow!("Invalid value for {}: {}", flag, value))
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args::default();
    let mut i = 1;

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--help" | "-h" => {
                parsed.help = true;
                i += 1;
                continue;
            }
            "--config" => parsed.config = Some(PathBuf::from(value_of(args, i + 1, flag)?)),
            "--population" => parsed.population = Some(number_of(args, i + 1, flag)?),
            "--generations" => parsed.generations = Some(number_of(args, i + 1, flag)?),
            "--seed" => parsed.seed = Some(number_of(args, i + 1, flag)?),
            "--key" => parsed.key = Some(value_of(args, i + 1, flag)?.to_string()),
            "--output" => parsed.output = Some(value_of(args, i + 1, flag)?.to_string()),
            _ if flag.starts_with('-') => bail!("Unknown option: {}", flag),
            _ => {
                if parsed.input.is_some() {
                    bail!("Only one input file may be given");
                }
                parsed.input = Some(PathBuf::from(flag));
                i += 1;
                continue;
            }
        }
        i += 2;
    }

    Ok(parsed)
}

/// File settings with command-line overrides applied
fn build_config(args: &Args) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };

    if let Some(population) = args.population {
        config.population_size = population;
    }
    if let Some(generations) = args.generations {
        config.generations = generations;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(key) = &args.key {
        config.key = Some(key.clone());
    }
    if let Some(output) = &args.output {
        config.output.path = Some(output.clone());
    }

    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Accompanist - Evolutionary Melody Harmonizer");
        println!("Run with --help for usage information");
        return Ok(());
    }

    let parsed = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    if parsed.help {
        print_usage();
        return Ok(());
    }

    let Some(input) = parsed.input.clone() else {
        eprintln!("Error: no input file given");
        print_usage();
        std::process::exit(1);
    };

    let session = Session::new(build_config(&parsed)?)?;
    let report = session.run(&input)?;

    if let KeySource::Detected { correlation } = report.key_source {
        info!("Key estimate correlation: {:.3}", correlation);
    }
    if report.skipped_notes > 0 {
        info!("{} chord notes fell outside the MIDI range", report.skipped_notes);
    }
    info!("Best fitness: {} (seed {})", report.harmonization.fitness, report.harmonization.seed);
    println!("{}", report.output_path.display());

    Ok(())
}
