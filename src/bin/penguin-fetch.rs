//! Download the raw Palmer penguins CSV.

use std::path::PathBuf;

use penguin_predictor::{config, fetch, logging};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config = config::load_or_default().map_err(|err| err.to_string())?;
    let Some(options) = parse_args(
        std::env::args().skip(1).collect(),
        CliOptions {
            url: config.fetch.url,
            out: config.paths.raw_csv,
        },
    )?
    else {
        println!("{}", help_text());
        return Ok(());
    };
    if let Err(err) = logging::init("penguin-fetch") {
        eprintln!("Logging disabled: {err}");
    }

    let bytes = fetch::download_file(&options.url, &options.out).map_err(|err| err.to_string())?;
    println!("Wrote {bytes} bytes to {}", options.out.display());
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    url: String,
    out: PathBuf,
}

/// `None` when help was requested.
fn parse_args(args: Vec<String>, defaults: CliOptions) -> Result<Option<CliOptions>, String> {
    let mut options = defaults;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Ok(None),
            "--url" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--url requires a value".to_string())?;
                options.url = value.clone();
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                options.out = PathBuf::from(value);
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(Some(options))
}

fn help_text() -> String {
    [
        "penguin-fetch",
        "",
        "Downloads the raw Palmer penguins CSV.",
        "",
        "Usage:",
        "  penguin-fetch [--url <url>] [--out <file>]",
        "",
        "Options:",
        "  --url <url>    Source URL (default: [fetch] url in config.toml).",
        "  --out <file>   Destination file (default: data/raw/palmer.csv).",
    ]
    .join("\n")
}
