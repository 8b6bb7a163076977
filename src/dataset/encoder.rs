use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::DatasetError;
use super::table::{EncodedLabels, LabelSeries};

/// Bijective mapping between class names and integer codes.
///
/// Classes are sorted, so code `i` is the `i`-th class name in lexical order.
/// This is the only type that turns codes back into names; it is persisted
/// next to every partition set that carries codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit over the distinct values observed.
    pub fn fit<S: AsRef<str>>(values: &[S]) -> Self {
        let classes: BTreeSet<&str> = values.iter().map(AsRef::as_ref).collect();
        Self {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn class_index_map(&self) -> BTreeMap<&str, usize> {
        self.classes
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), idx))
            .collect()
    }

    pub fn transform<S: AsRef<str>>(&self, values: &[S]) -> Result<Vec<usize>, DatasetError> {
        let map = self.class_index_map();
        values
            .iter()
            .map(|value| {
                map.get(value.as_ref())
                    .copied()
                    .ok_or_else(|| DatasetError::UnknownLabel {
                        label: value.as_ref().to_string(),
                    })
            })
            .collect()
    }

    /// Decode a single code.
    pub fn decode(&self, code: usize) -> Result<&str, DatasetError> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or(DatasetError::UnknownCode {
                code,
                n_classes: self.classes.len(),
            })
    }

    pub fn inverse_transform(&self, codes: &[usize]) -> Result<Vec<String>, DatasetError> {
        codes
            .iter()
            .map(|&code| self.decode(code).map(str::to_string))
            .collect()
    }
}

/// Fit an encoder over `series` and return the coded series with it.
pub fn encode_label(series: &LabelSeries) -> (EncodedLabels, LabelEncoder) {
    let encoder = LabelEncoder::fit(&series.values);
    let map = encoder.class_index_map();
    let codes = series.values.iter().map(|value| map[value.as_str()]).collect();
    let encoded = EncodedLabels {
        name: series.name.clone(),
        index: series.index.clone(),
        codes,
        n_classes: encoder.n_classes(),
    };
    (encoded, encoder)
}
