use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::FormError;
use crate::dataset::artifacts::{artifact_path, artifact_stem};

/// Stems of the model files in `dir`, sorted. A missing directory is empty.
pub fn list_models(dir: &Path) -> Result<Vec<String>, FormError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!("Models directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(FormError::ModelsDir {
                path: dir.to_path_buf(),
                source,
            });
        }
    };
    let mut stems: Vec<String> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| artifact_stem(&entry.path()))
        .collect();
    stems.sort();
    Ok(stems)
}

pub fn model_path(dir: &Path, stem: &str) -> PathBuf {
    artifact_path(dir, stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lists_json_stems_in_order() {
        let dir = tempdir().unwrap();
        for name in ["model_acc_0.971.json", "gbdt.json", ".hidden.json", "notes.txt"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        std::fs::create_dir(dir.path().join("archive.json")).unwrap();

        assert_eq!(
            list_models(dir.path()).unwrap(),
            vec!["gbdt", "model_acc_0.971"]
        );
        assert_eq!(
            model_path(dir.path(), "gbdt"),
            dir.path().join("gbdt.json")
        );
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let dir = tempdir().unwrap();
        assert!(list_models(&dir.path().join("models")).unwrap().is_empty());
    }
}
