use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dataset::{DEFAULT_FEATURES, DEFAULT_LABEL, PrepareOptions};
use crate::form::FormPaths;
use crate::ml::TrainOptions;

/// Palmer penguins CSV published with the `palmerpenguins` R package.
pub const DEFAULT_FETCH_URL: &str =
    "https://raw.githubusercontent.com/allisonhorst/palmerpenguins/master/inst/extdata/penguins.csv";
pub const DEFAULT_OBJECTIVE: &str = "multi:softprob";

const MIN_TEST_FRACTION: f64 = 0.01;
const MAX_TEST_FRACTION: f64 = 0.99;

/// Everything stored in `config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathSettings,
    pub fetch: FetchSettings,
    pub prepare: PrepareSettings,
    pub train: TrainSettings,
}

impl AppConfig {
    /// Pull out-of-range values back to usable ones.
    pub fn normalized(mut self) -> Self {
        self.prepare = self.prepare.normalized();
        self.train = self.train.normalized();
        self
    }
}

/// Where each stage reads and writes its files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub raw_csv: PathBuf,
    pub processed_dir: PathBuf,
    pub models_dir: PathBuf,
    pub figures_dir: PathBuf,
    pub images_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            raw_csv: PathBuf::from("data/raw/palmer.csv"),
            processed_dir: PathBuf::from("data/processed"),
            models_dir: PathBuf::from("models"),
            figures_dir: PathBuf::from("data/figures"),
            images_dir: PathBuf::from("assets/images"),
        }
    }
}

impl PathSettings {
    pub fn form_paths(&self) -> FormPaths {
        FormPaths {
            processed_dir: self.processed_dir.clone(),
            models_dir: self.models_dir.clone(),
            images_dir: self.images_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub url: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_FETCH_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareSettings {
    pub test_fraction: f64,
    pub seed: u64,
    /// Rows with at least this many missing features are dropped.
    pub max_missing: usize,
    pub features: Vec<String>,
    pub label: String,
}

impl Default for PrepareSettings {
    fn default() -> Self {
        Self {
            test_fraction: 0.3,
            seed: 42,
            max_missing: 1,
            features: DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect(),
            label: DEFAULT_LABEL.to_string(),
        }
    }
}

impl PrepareSettings {
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        self.test_fraction = if self.test_fraction.is_finite() {
            self.test_fraction.clamp(MIN_TEST_FRACTION, MAX_TEST_FRACTION)
        } else {
            defaults.test_fraction
        };
        self.max_missing = self.max_missing.max(1);
        self.features.retain(|name| !name.trim().is_empty());
        if self.features.is_empty() {
            self.features = defaults.features;
        }
        if self.label.trim().is_empty() {
            self.label = defaults.label;
        }
        self
    }

    /// Preparation options reading `paths.raw_csv` into `paths.processed_dir`.
    pub fn to_options(&self, paths: &PathSettings) -> PrepareOptions {
        PrepareOptions {
            input: paths.raw_csv.clone(),
            out_dir: paths.processed_dir.clone(),
            test_fraction: self.test_fraction,
            seed: self.seed,
            max_missing: self.max_missing,
            features: self.features.clone(),
            label: self.label.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainSettings {
    /// Parsed by the trainer, so an unknown name fails there with context.
    pub objective: String,
    pub seed: u64,
    pub rounds: usize,
    pub learning_rate: f32,
    pub max_depth: usize,
}

impl Default for TrainSettings {
    fn default() -> Self {
        let options = TrainOptions::default();
        Self {
            objective: DEFAULT_OBJECTIVE.to_string(),
            seed: options.seed,
            rounds: options.rounds,
            learning_rate: options.learning_rate,
            max_depth: options.max_depth,
        }
    }
}

impl TrainSettings {
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if self.objective.trim().is_empty() {
            self.objective = defaults.objective;
        }
        self.rounds = self.rounds.max(1);
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            self.learning_rate = defaults.learning_rate;
        }
        self.max_depth = self.max_depth.max(1);
        self
    }

    pub fn to_options(&self) -> TrainOptions {
        TrainOptions {
            rounds: self.rounds,
            learning_rate: self.learning_rate,
            max_depth: self.max_depth,
            seed: self.seed,
            ..TrainOptions::default()
        }
    }
}
