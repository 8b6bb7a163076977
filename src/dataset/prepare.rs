use std::path::PathBuf;

use tracing::info;

use super::artifacts::persist;
use super::encoder::encode_label;
use super::table::{select_features, select_label};
use super::{DatasetError, clean::clean, loader::load, split::split};

/// Default feature columns of the Palmer penguins table.
pub const DEFAULT_FEATURES: [&str; 4] = [
    "bill_length_mm",
    "bill_depth_mm",
    "flipper_length_mm",
    "body_mass_g",
];
/// Default label column.
pub const DEFAULT_LABEL: &str = "species";

/// Inputs for a full preparation run.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepareOptions {
    pub input: PathBuf,
    pub out_dir: PathBuf,
    pub test_fraction: f64,
    pub seed: u64,
    pub max_missing: usize,
    pub features: Vec<String>,
    pub label: String,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/raw/palmer.csv"),
            out_dir: PathBuf::from("data/processed"),
            test_fraction: 0.3,
            seed: 42,
            max_missing: 1,
            features: DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect(),
            label: DEFAULT_LABEL.to_string(),
        }
    }
}

/// Row counts and artifacts from a preparation run.
#[derive(Debug, Clone)]
pub struct PrepareSummary {
    pub raw_rows: usize,
    pub dropped_rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub classes: Vec<String>,
    pub artifacts: Vec<PathBuf>,
}

/// Load, encode, clean, split and persist the dataset described by `options`.
pub fn prepare(options: &PrepareOptions) -> Result<PrepareSummary, DatasetError> {
    info!("Reading data from {}", options.input.display());
    let raw = load(&options.input)?;
    let features = select_features(&raw, &options.features)?;
    let labels = select_label(&raw, &options.label)?;

    info!("Encoding labels...");
    let (labels, encoder) = encode_label(&labels);

    info!("Handling missing values...");
    let (features, labels) = clean(&features, &labels, options.max_missing)?;
    let dropped_rows = raw.len() - features.len();

    info!("Splitting training and testing data...");
    let partitions = split(&features, &labels, options.test_fraction, options.seed)?;

    info!("Saving data to {}", options.out_dir.display());
    let artifacts = persist(&partitions, &encoder, &options.out_dir)?;

    info!(
        "Preprocessing and cleaning complete: {} train / {} test rows, {dropped_rows} dropped",
        partitions.x_train.len(),
        partitions.x_test.len()
    );
    Ok(PrepareSummary {
        raw_rows: raw.len(),
        dropped_rows,
        train_rows: partitions.x_train.len(),
        test_rows: partitions.x_test.len(),
        classes: encoder.classes().to_vec(),
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SplitError;
    use crate::dataset::artifacts::PartitionSet;
    use tempfile::tempdir;

    const HEADER: &str =
        "species,island,bill_length_mm,bill_depth_mm,flipper_length_mm,body_mass_g,sex";

    fn write_csv(dir: &std::path::Path, rows: &[&str]) -> PathBuf {
        let path = dir.join("palmer.csv");
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        std::fs::write(&path, text).unwrap();
        path
    }

    fn options(dir: &std::path::Path, input: PathBuf) -> PrepareOptions {
        PrepareOptions {
            input,
            out_dir: dir.join("processed"),
            ..PrepareOptions::default()
        }
    }

    #[test]
    fn runs_every_stage_and_persists_artifacts() {
        let dir = tempdir().unwrap();
        let mut rows = Vec::new();
        for i in 0..10 {
            rows.push(format!("Adelie,Torgersen,{},18.{i},190,3700,male", 38 + i % 3));
            rows.push(format!("Gentoo,Biscoe,{},14.{i},215,5000,female", 47 + i % 3));
        }
        rows.push("Adelie,Torgersen,NA,NA,NA,NA,NA".to_string());
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let input = write_csv(dir.path(), &refs);

        let summary = prepare(&options(dir.path(), input)).unwrap();

        assert_eq!(summary.raw_rows, 21);
        assert_eq!(summary.dropped_rows, 1);
        assert_eq!(summary.train_rows + summary.test_rows, 20);
        assert_eq!(summary.test_rows, 6);
        assert_eq!(summary.classes, vec!["Adelie", "Gentoo"]);
        assert_eq!(summary.artifacts.len(), 5);

        let set = PartitionSet::load(&dir.path().join("processed")).unwrap();
        assert_eq!(set.x_train.columns, DEFAULT_FEATURES);
        assert_eq!(set.y_test.class_counts(), vec![3, 3]);
    }

    #[test]
    fn class_lost_during_cleaning_stops_the_split() {
        let dir = tempdir().unwrap();
        let input = write_csv(
            dir.path(),
            &[
                "Adelie,Torgersen,39.1,18.7,181,3750,male",
                "Adelie,Torgersen,39.5,17.4,186,3800,female",
                "Adelie,Torgersen,40.3,18.0,195,3250,female",
                "Chinstrap,Dream,NA,17.9,NA,3500,female",
                "Gentoo,Biscoe,46.1,13.2,211,4500,female",
                "Gentoo,Biscoe,50.0,16.3,230,5700,male",
            ],
        );

        let err = prepare(&options(dir.path(), input)).unwrap_err();

        assert!(matches!(
            err,
            DatasetError::Split(SplitError::EmptyClass { code: 1 })
        ));
        assert!(!dir.path().join("processed").exists());
    }

    #[test]
    fn missing_feature_column_is_a_schema_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("palmer.csv");
        std::fs::write(&path, "species,bill_length_mm\nAdelie,39.1\n").unwrap();

        let err = prepare(&options(dir.path(), path)).unwrap_err();

        assert!(matches!(err, DatasetError::MissingColumn { column } if column == "bill_depth_mm"));
    }
}
