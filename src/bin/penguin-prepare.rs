//! Clean the raw CSV and write stratified train/test partitions.

use std::path::PathBuf;

use penguin_predictor::dataset::{PrepareOptions, prepare};
use penguin_predictor::{config, logging};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config = config::load_or_default().map_err(|err| err.to_string())?;
    let defaults = config.prepare.to_options(&config.paths);
    let Some(options) = parse_args(std::env::args().skip(1).collect(), defaults)? else {
        println!("{}", help_text());
        return Ok(());
    };
    if let Err(err) = logging::init("penguin-prepare") {
        eprintln!("Logging disabled: {err}");
    }

    let summary = prepare(&options).map_err(|err| err.to_string())?;
    println!(
        "rows: {} raw, {} dropped, {} train, {} test",
        summary.raw_rows, summary.dropped_rows, summary.train_rows, summary.test_rows
    );
    println!("classes: {}", summary.classes.join(", "));
    for path in &summary.artifacts {
        println!("wrote {}", path.display());
    }
    Ok(())
}

/// `None` when help was requested.
fn parse_args(
    args: Vec<String>,
    defaults: PrepareOptions,
) -> Result<Option<PrepareOptions>, String> {
    let mut options = defaults;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Ok(None),
            "--test-size" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--test-size requires a value".to_string())?;
                options.test_fraction = value
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid --test-size value: {value}"))?;
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                options.out_dir = PathBuf::from(value);
            }
            "--input" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--input requires a value".to_string())?;
                options.input = PathBuf::from(value);
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                options.seed = value
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid --seed value: {value}"))?;
            }
            "--max-missing" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--max-missing requires a value".to_string())?;
                options.max_missing = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --max-missing value: {value}"))?;
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(Some(options))
}

fn help_text() -> String {
    [
        "penguin-prepare",
        "",
        "Encodes labels, drops incomplete rows and writes stratified partitions.",
        "",
        "Usage:",
        "  penguin-prepare [options]",
        "",
        "Options:",
        "  --input <file>       Raw CSV (default: data/raw/palmer.csv).",
        "  --out <dir>          Output directory (default: data/processed).",
        "  --test-size <f64>    Test fraction in (0, 1) (default: 0.3).",
        "  --seed <u64>         Split seed (default: 42).",
        "  --max-missing <n>    Drop rows with at least n missing features (default: 1).",
    ]
    .join("\n")
}
