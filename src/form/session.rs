use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use tracing::info;
use uuid::Uuid;

use super::FormError;
use super::ranges::{FieldRange, range_for};
use crate::dataset::artifacts::{X_TRAIN, Y_ENCODER, artifact_path, read_encoder, read_features};
use crate::dataset::{FeatureTable, LabelEncoder};

/// Identifies one run of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One numeric input: the feature column and its bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureField {
    pub name: String,
    pub range: FieldRange,
}

/// Field ranges for every column of the training features.
pub fn feature_fields(x_train: &FeatureTable) -> Result<Vec<FeatureField>, FormError> {
    x_train
        .columns
        .iter()
        .map(|name| {
            let values = x_train.column_values(name).unwrap_or_default();
            let range = range_for(&values).map_err(|source| FormError::Range {
                column: name.clone(),
                source,
            })?;
            Ok(FeatureField {
                name: name.clone(),
                range,
            })
        })
        .collect()
}

#[derive(Debug, Default)]
struct SessionEntry {
    fields: Option<Vec<FeatureField>>,
    encoder: Option<LabelEncoder>,
}

/// Per-session cache of values the form derives from processed artifacts.
///
/// Each value is computed on first request and reused until the session
/// ends. Failures are not cached.
#[derive(Debug, Default)]
pub struct SessionMemo {
    entries: HashMap<SessionId, SessionEntry>,
}

impl SessionMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field ranges over `X_train` in `processed_dir`.
    pub fn field_ranges(
        &mut self,
        session: SessionId,
        processed_dir: &Path,
    ) -> Result<&[FeatureField], FormError> {
        let entry = self.entries.entry(session).or_default();
        let fields = match entry.fields.take() {
            Some(fields) => fields,
            None => {
                let x_train = read_features(&artifact_path(processed_dir, X_TRAIN))?;
                let fields = feature_fields(&x_train)?;
                info!("Session {session}: derived {} field ranges", fields.len());
                fields
            }
        };
        Ok(entry.fields.insert(fields))
    }

    /// The label encoder persisted next to the partitions.
    pub fn label_space(
        &mut self,
        session: SessionId,
        processed_dir: &Path,
    ) -> Result<&LabelEncoder, FormError> {
        let entry = self.entries.entry(session).or_default();
        let encoder = match entry.encoder.take() {
            Some(encoder) => encoder,
            None => read_encoder(&artifact_path(processed_dir, Y_ENCODER))?,
        };
        Ok(entry.encoder.insert(encoder))
    }

    /// Drop everything cached for `session`.
    pub fn end(&mut self, session: SessionId) {
        self.entries.remove(&session);
    }

    pub fn sessions(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::artifacts::{Artifact, ARTIFACT_EXT};
    use tempfile::tempdir;

    fn write_artifacts(dir: &Path) {
        let x_train = FeatureTable::new(
            vec!["bill_length_mm".into(), "body_mass_g".into()],
            vec![0, 1, 2],
            vec![
                vec![Some(10.0), Some(3000.0)],
                vec![Some(20.0), Some(4000.0)],
                vec![Some(30.0), Some(5000.0)],
            ],
        )
        .unwrap();
        let encoder = LabelEncoder::fit(&["Adelie", "Gentoo"]);
        std::fs::write(
            dir.join(format!("{X_TRAIN}.{ARTIFACT_EXT}")),
            serde_json::to_vec(&Artifact::Features(x_train)).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.join(format!("{Y_ENCODER}.{ARTIFACT_EXT}")),
            serde_json::to_vec(&Artifact::Encoder(encoder)).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn ranges_are_computed_once_per_session() {
        let dir = tempdir().unwrap();
        write_artifacts(dir.path());
        let mut memo = SessionMemo::new();
        let session = SessionId::new();

        let first = memo.field_ranges(session, dir.path()).unwrap().to_vec();
        assert_eq!(first[0].name, "bill_length_mm");
        assert_eq!(
            first[0].range,
            FieldRange {
                min: 1.0,
                max: 38.0,
                step: 1.0
            }
        );

        std::fs::remove_file(dir.path().join("X_train.json")).unwrap();
        let second = memo.field_ranges(session, dir.path()).unwrap();
        assert_eq!(second, first.as_slice());

        let other = SessionId::new();
        assert!(memo.field_ranges(other, dir.path()).is_err());
    }

    #[test]
    fn label_space_is_memoized_until_the_session_ends() {
        let dir = tempdir().unwrap();
        write_artifacts(dir.path());
        let mut memo = SessionMemo::new();
        let session = SessionId::new();

        assert_eq!(memo.label_space(session, dir.path()).unwrap().n_classes(), 2);
        std::fs::remove_file(dir.path().join("y_encoder.json")).unwrap();
        assert!(memo.label_space(session, dir.path()).is_ok());

        memo.end(session);
        assert_eq!(memo.sessions(), 0);
        assert!(memo.label_space(session, dir.path()).is_err());
    }

    #[test]
    fn non_positive_column_names_the_field() {
        let table = FeatureTable::new(
            vec!["bill_depth_mm".into()],
            vec![0, 1],
            vec![vec![Some(0.0)], vec![Some(5.0)]],
        )
        .unwrap();
        let err = feature_fields(&table).unwrap_err();
        assert!(matches!(err, FormError::Range { column, .. } if column == "bill_depth_mm"));
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
