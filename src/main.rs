mod aggregate;
mod cli;
mod config;
mod edge_lists;
mod engine;
mod error;
mod grid;
mod grid_io;
mod mask;

use config::RunSettings;
use engine::{FilterConfig, FilterEngine};
use error::FilterError;
use std::env;
use std::process::ExitCode;
use std::time::Instant;

fn get_formatted_elapsed_time(instant: Instant) -> String {
    let dur = instant.elapsed();
    let minutes = dur.as_secs() / 60;
    let sub_sec = dur.as_secs() % 60;
    let sub_milli = dur.subsec_millis();
    if minutes > 0 {
        return format!("{}min {}.{}s", minutes, sub_sec, sub_milli);
    }
    format!("{}.{}s", sub_sec, sub_milli)
}

fn main() -> ExitCode {
    let raw: Vec<String> = env::args().skip(1).collect();

    let args = match cli::parse(&raw) {
        Ok(a) => a,
        Err(FilterError::Usage(msg)) => {
            eprintln!("{}", msg);
            return ExitCode::from(1);
        }
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let settings = RunSettings::load();

    println!("* Welcome to focal_filter *");
    println!("Input file: {}", args.input_path);
    println!("Output file: {}", args.output_path);
    println!("Radius: {}", args.radius);
    println!("Aggregate: {}", args.aggregate.name());
    println!("Coverage: {}", args.coverage);

    match run(&args, &settings) {
        Ok(elapsed) => {
            println!("Elapsed time: {}", elapsed);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn run(args: &cli::Args, settings: &RunSettings) -> error::Result<String> {
    let start = Instant::now();

    let input = grid_io::read_arcascii(&args.input_path)?;
    let config = FilterConfig::new(args.radius, args.aggregate, args.coverage)?;
    let engine = FilterEngine::new(&config)?;
    let output = engine.run(&input, settings)?;
    grid_io::write_arcascii(&args.output_path, &output)?;

    Ok(get_formatted_elapsed_time(start))
}
