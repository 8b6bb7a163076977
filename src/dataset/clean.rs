use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::DatasetError;
use super::table::{EncodedLabels, FeatureTable};

/// Drop rows with `max_missing` or more missing features and zero-fill the rest.
///
/// Missing cells in retained rows become `0.0`, which the boosted trees route
/// like any other value. Labels are re-aligned to the surviving rows by index
/// label, not by position.
pub fn clean(
    features: &FeatureTable,
    labels: &EncodedLabels,
    max_missing: usize,
) -> Result<(FeatureTable, EncodedLabels), DatasetError> {
    if max_missing == 0 {
        return Err(DatasetError::InvalidArgument(
            "max_missing must be at least 1".to_string(),
        ));
    }
    if features.len() != labels.len() {
        return Err(DatasetError::LengthMismatch {
            left: features.len(),
            right: labels.len(),
        });
    }
    let label_positions = index_positions(&labels.index)?;
    let mut seen = HashSet::with_capacity(features.len());

    let mut kept_rows: Vec<Vec<Option<f64>>> = Vec::with_capacity(features.len());
    let mut kept_index = Vec::with_capacity(features.len());
    let mut label_order = Vec::with_capacity(features.len());
    for (pos, row) in features.rows.iter().enumerate() {
        let index = features.index[pos];
        if !seen.insert(index) {
            return Err(DatasetError::DuplicateIndex { index });
        }
        let label_pos = *label_positions
            .get(&index)
            .ok_or(DatasetError::IndexMismatch { index })?;
        if features.missing_in_row(pos) >= max_missing {
            continue;
        }
        kept_rows.push(row.iter().map(|cell| Some(cell.unwrap_or(0.0))).collect());
        kept_index.push(index);
        label_order.push(label_pos);
    }
    debug!(
        "Dropped {} of {} rows with >= {max_missing} missing features",
        features.len() - kept_rows.len(),
        features.len()
    );

    let cleaned = FeatureTable::new(features.columns.clone(), kept_index, kept_rows)?;
    Ok((cleaned, labels.take(&label_order)))
}

/// Position of each index value; a repeated value is an error.
fn index_positions(index: &[usize]) -> Result<HashMap<usize, usize>, DatasetError> {
    let mut positions = HashMap::with_capacity(index.len());
    for (pos, &idx) in index.iter().enumerate() {
        if positions.insert(idx, pos).is_some() {
            return Err(DatasetError::DuplicateIndex { index: idx });
        }
    }
    Ok(positions)
}
