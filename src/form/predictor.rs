use super::FormError;
use super::session::FeatureField;
use crate::dataset::{FeatureTable, LabelEncoder};
use crate::ml::ModelArtifact;

/// A decoded prediction for one set of measurements.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub code: usize,
    pub label: String,
}

impl Prediction {
    /// Label as shown to the operator.
    pub fn headline(&self) -> String {
        self.label.to_uppercase()
    }

    /// Picture file for the label, e.g. `adelie.png`.
    pub fn image_name(&self) -> String {
        format!("{}.png", self.label.to_lowercase())
    }
}

/// Run `model` on one row of `values` ordered like `fields` and decode the
/// class through `encoder`.
pub fn predict_one(
    model: &ModelArtifact,
    encoder: &LabelEncoder,
    fields: &[FeatureField],
    values: &[f64],
) -> Result<Prediction, FormError> {
    let columns = fields.iter().map(|field| field.name.clone()).collect();
    let row = FeatureTable::single_row(columns, values)?;
    let code = model
        .predict(&row)?
        .first()
        .copied()
        .ok_or(FormError::NoPrediction)?;
    let label = encoder.decode(code)?.to_string();
    Ok(Prediction { code, label })
}
