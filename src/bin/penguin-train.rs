//! Train the boosted-tree classifier on the prepared partitions.

use std::path::PathBuf;

use penguin_predictor::ml::metrics::{ConfusionMatrix, precision_recall_by_class};
use penguin_predictor::ml::{
    EvalSplit, LOSS_PLOT_FILE, Objective, TrainOptions, Trainer, plot_loss_curves,
};
use penguin_predictor::{config, logging};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config = config::load_or_default().map_err(|err| err.to_string())?;
    let defaults = CliOptions {
        input: config.paths.processed_dir.clone(),
        out: config.paths.models_dir.join("model.json"),
        rename: false,
        objective: config.train.objective.clone(),
        seed: config.train.seed,
        rounds: config.train.rounds,
        learning_rate: config.train.learning_rate,
        max_depth: config.train.max_depth,
        figures: config.paths.figures_dir.clone(),
    };
    let Some(options) = parse_args(std::env::args().skip(1).collect(), defaults)? else {
        println!("{}", help_text());
        return Ok(());
    };
    if let Err(err) = logging::init("penguin-train") {
        eprintln!("Logging disabled: {err}");
    }

    let objective = options
        .objective
        .parse::<Objective>()
        .map_err(|err| err.to_string())?;
    let train_options = TrainOptions {
        rounds: options.rounds,
        learning_rate: options.learning_rate,
        max_depth: options.max_depth,
        ..config.train.to_options()
    };
    let mut trainer = Trainer::from_dir(&options.input)
        .map_err(|err| err.to_string())?
        .with_options(train_options);
    let acc = trainer
        .fit(objective, options.seed)
        .map_err(|err| err.to_string())?;

    let history = trainer.evaluate().map_err(|err| err.to_string())?;
    let plot_path = options.figures.join(LOSS_PLOT_FILE);
    plot_loss_curves(history, &plot_path).map_err(|err| err.to_string())?;
    let written = trainer
        .save(&options.out, options.rename)
        .map_err(|err| err.to_string())?;

    println!("test accuracy: {:.4}", acc);
    let cm = trainer
        .confusion_matrix(EvalSplit::Test)
        .map_err(|err| err.to_string())?;
    print_report(trainer.partitions().encoder.classes(), &cm);
    println!("loss curves: {}", plot_path.display());
    println!("model: {}", written.display());
    Ok(())
}

fn print_report(classes: &[String], cm: &ConfusionMatrix) {
    for (idx, stats) in precision_recall_by_class(cm).iter().enumerate() {
        let name = classes.get(idx).map(String::as_str).unwrap_or("?");
        println!(
            "class {:>2} {:<12}  precision={:.3}  recall={:.3}  support={}",
            idx, name, stats.precision, stats.recall, stats.support
        );
    }
    println!("confusion matrix (rows=true, cols=pred):");
    for truth in 0..cm.n_classes {
        let mut row = String::new();
        for pred in 0..cm.n_classes {
            row.push_str(&format!("{:6}", cm.get(truth, pred)));
        }
        println!("{row}");
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    input: PathBuf,
    out: PathBuf,
    rename: bool,
    objective: String,
    seed: u64,
    rounds: usize,
    learning_rate: f32,
    max_depth: usize,
    figures: PathBuf,
}

/// `None` when help was requested.
fn parse_args(args: Vec<String>, defaults: CliOptions) -> Result<Option<CliOptions>, String> {
    let mut options = defaults;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Ok(None),
            "--rename" => options.rename = true,
            "--input" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--input requires a value".to_string())?;
                options.input = PathBuf::from(value);
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                options.out = PathBuf::from(value);
            }
            "--objective" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--objective requires a value".to_string())?;
                options.objective = value.clone();
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                options.seed = value
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid --seed value: {value}"))?;
            }
            "--rounds" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--rounds requires a value".to_string())?;
                options.rounds = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --rounds value: {value}"))?;
            }
            "--learning-rate" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--learning-rate requires a value".to_string())?;
                options.learning_rate = value
                    .parse::<f32>()
                    .map_err(|_| format!("Invalid --learning-rate value: {value}"))?;
            }
            "--max-depth" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--max-depth requires a value".to_string())?;
                options.max_depth = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --max-depth value: {value}"))?;
            }
            "--figures" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--figures requires a value".to_string())?;
                options.figures = PathBuf::from(value);
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(Some(options))
}

fn help_text() -> String {
    [
        "penguin-train",
        "",
        "Trains a gradient-boosted tree classifier on the prepared partitions.",
        "",
        "Usage:",
        "  penguin-train [options]",
        "",
        "Options:",
        "  --input <dir>           Processed partitions (default: data/processed).",
        "  --out <file>            Model artifact (default: models/model.json).",
        "  --rename                Embed the test accuracy in the file name.",
        "  --objective <name>      multi:softprob, multi:softmax or binary:logistic",
        "                          (default: multi:softprob).",
        "  --seed <u64>            Training seed (default: 42).",
        "  --rounds <n>            Maximum boosting rounds (default: 100).",
        "  --learning-rate <f32>   Shrinkage per round (default: 0.3).",
        "  --max-depth <n>         Tree depth (default: 3).",
        "  --figures <dir>         Loss plot directory (default: data/figures).",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> CliOptions {
        CliOptions {
            input: PathBuf::from("data/processed"),
            out: PathBuf::from("models/model.json"),
            rename: false,
            objective: "multi:softprob".into(),
            seed: 42,
            rounds: 100,
            learning_rate: 0.3,
            max_depth: 3,
            figures: PathBuf::from("data/figures"),
        }
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn no_flags_keeps_defaults() {
        assert_eq!(parse_args(Vec::new(), defaults()).unwrap(), Some(defaults()));
    }

    #[test]
    fn parses_flags() {
        let options = parse_args(
            args(&[
                "--rename",
                "--objective",
                "multi:softmax",
                "--rounds",
                "20",
                "--learning-rate",
                "0.1",
                "--max-depth",
                "2",
                "--out",
                "m.json",
            ]),
            defaults(),
        )
        .unwrap()
        .unwrap();
        assert!(options.rename);
        assert_eq!(options.objective, "multi:softmax");
        assert_eq!(options.rounds, 20);
        assert_eq!(options.learning_rate, 0.1);
        assert_eq!(options.max_depth, 2);
        assert_eq!(options.out, PathBuf::from("m.json"));
    }

    #[test]
    fn rejects_missing_values() {
        let err = parse_args(args(&["--rounds"]), defaults()).unwrap_err();
        assert!(err.contains("--rounds"));
        assert_eq!(parse_args(args(&["--help"]), defaults()).unwrap(), None);
    }
}
