//! Tabular containers passed between the preparation and training stages.

use serde::{Deserialize, Serialize};

use super::DatasetError;

/// Cell spellings treated as missing when parsing raw CSV data.
pub const MISSING_MARKERS: &[&str] = &["", "NA", "NaN", "nan", "null", "None"];

/// Parsed delimited file: header names plus optional string cells per record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a named column.
    pub fn column_index(&self, name: &str) -> Result<usize, DatasetError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| DatasetError::MissingColumn {
                column: name.to_string(),
            })
    }
}

/// Numeric feature columns with a row index pointing back at the raw table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub index: Vec<usize>,
    pub rows: Vec<Vec<Option<f64>>>,
}

impl FeatureTable {
    /// Build a table, checking that every row matches the column count.
    pub fn new(
        columns: Vec<String>,
        index: Vec<usize>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, DatasetError> {
        if index.len() != rows.len() {
            return Err(DatasetError::LengthMismatch {
                left: index.len(),
                right: rows.len(),
            });
        }
        if let Some(row) = rows.iter().find(|row| row.len() != columns.len()) {
            return Err(DatasetError::LengthMismatch {
                left: columns.len(),
                right: row.len(),
            });
        }
        Ok(Self {
            columns,
            index,
            rows,
        })
    }

    /// One-row table, used to feed operator input to a model.
    pub fn single_row(columns: Vec<String>, values: &[f64]) -> Result<Self, DatasetError> {
        let row = values.iter().copied().map(Some).collect();
        Self::new(columns, vec![0], vec![row])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count of missing cells in the row at `position`.
    pub fn missing_in_row(&self, position: usize) -> usize {
        self.rows
            .get(position)
            .map(|row| row.iter().filter(|cell| cell.is_none()).count())
            .unwrap_or(0)
    }

    /// Non-missing values of a named column, in row order.
    pub fn column_values(&self, name: &str) -> Option<Vec<f64>> {
        let col = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().filter_map(|row| row[col]).collect())
    }

    /// Rows at the given positions, in the given order.
    pub fn take(&self, positions: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            index: positions.iter().map(|&p| self.index[p]).collect(),
            rows: positions.iter().map(|&p| self.rows[p].clone()).collect(),
        }
    }

    /// Dense `f32` rows for the classifier; missing cells read as zero.
    pub fn dense_rows(&self) -> Vec<Vec<f32>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.unwrap_or(0.0) as f32).collect())
            .collect()
    }
}

/// Raw string labels aligned to a row index.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSeries {
    pub name: String,
    pub index: Vec<usize>,
    pub values: Vec<String>,
}

/// Integer-coded labels aligned to a row index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedLabels {
    pub name: String,
    pub index: Vec<usize>,
    pub codes: Vec<usize>,
    /// Size of the label space the codes were drawn from.
    pub n_classes: usize,
}

impl EncodedLabels {
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Rows at the given positions, in the given order.
    pub fn take(&self, positions: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            index: positions.iter().map(|&p| self.index[p]).collect(),
            codes: positions.iter().map(|&p| self.codes[p]).collect(),
            n_classes: self.n_classes,
        }
    }

    /// Row count per class code.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &code in &self.codes {
            if let Some(count) = counts.get_mut(code) {
                *count += 1;
            }
        }
        counts
    }
}

/// Project the named feature columns, parsing cells as numbers.
pub fn select_features(table: &RawTable, names: &[String]) -> Result<FeatureTable, DatasetError> {
    let positions = names
        .iter()
        .map(|name| table.column_index(name))
        .collect::<Result<Vec<_>, _>>()?;
    let mut rows = Vec::with_capacity(table.len());
    for (row_idx, record) in table.rows.iter().enumerate() {
        let mut row = Vec::with_capacity(positions.len());
        for (&col, name) in positions.iter().zip(names) {
            row.push(parse_number(record[col].as_deref(), name, row_idx)?);
        }
        rows.push(row);
    }
    FeatureTable::new(names.to_vec(), (0..table.len()).collect(), rows)
}

/// Project the label column; every row must carry a label.
pub fn select_label(table: &RawTable, name: &str) -> Result<LabelSeries, DatasetError> {
    let col = table.column_index(name)?;
    let values = table
        .rows
        .iter()
        .enumerate()
        .map(|(row, record)| {
            record[col]
                .clone()
                .ok_or(DatasetError::MissingLabel { row })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LabelSeries {
        name: name.to_string(),
        index: (0..table.len()).collect(),
        values,
    })
}

fn parse_number(cell: Option<&str>, column: &str, row: usize) -> Result<Option<f64>, DatasetError> {
    let Some(text) = cell else {
        return Ok(None);
    };
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| DatasetError::InvalidNumber {
            column: column.to_string(),
            row,
            value: text.to_string(),
        })
}
