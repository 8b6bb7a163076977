use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ml::TrainError;

/// Learning objective, named the way the boosting CLI flags spell it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// Softmax boosting; predictions are per-class probabilities.
    #[serde(rename = "multi:softprob")]
    MultiSoftprob,
    /// Softmax boosting; predictions are the argmax class.
    #[serde(rename = "multi:softmax")]
    MultiSoftmax,
    /// One logistic tree per round for two classes.
    #[serde(rename = "binary:logistic")]
    BinaryLogistic,
}

impl Objective {
    pub const ALL: [Objective; 3] = [
        Objective::MultiSoftprob,
        Objective::MultiSoftmax,
        Objective::BinaryLogistic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Objective::MultiSoftprob => "multi:softprob",
            Objective::MultiSoftmax => "multi:softmax",
            Objective::BinaryLogistic => "binary:logistic",
        }
    }

    /// Loss reported per round.
    pub fn eval_metric(self) -> &'static str {
        match self {
            Objective::BinaryLogistic => "logloss",
            _ => "mlogloss",
        }
    }

    /// Number of trees grown per boosting round.
    pub fn output_groups(self, n_classes: usize) -> usize {
        match self {
            Objective::BinaryLogistic => 1,
            _ => n_classes,
        }
    }

    /// Reject label spaces this objective cannot model.
    pub fn check_label_space(self, n_classes: usize) -> Result<(), TrainError> {
        let ok = match self {
            Objective::BinaryLogistic => n_classes == 2,
            Objective::MultiSoftprob | Objective::MultiSoftmax => n_classes >= 2,
        };
        if ok {
            Ok(())
        } else {
            Err(TrainError::ObjectiveMismatch {
                objective: self.name(),
                n_classes,
            })
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Objective {
    type Err = TrainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Objective::ALL
            .into_iter()
            .find(|objective| objective.name() == trimmed)
            .ok_or_else(|| TrainError::UnknownObjective(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        assert_eq!(
            "multi:softprob".parse::<Objective>().unwrap(),
            Objective::MultiSoftprob
        );
        assert_eq!(
            " binary:logistic ".parse::<Objective>().unwrap(),
            Objective::BinaryLogistic
        );
        assert!(matches!(
            "reg:squarederror".parse::<Objective>(),
            Err(TrainError::UnknownObjective(name)) if name == "reg:squarederror"
        ));
    }

    #[test]
    fn binary_objective_needs_exactly_two_classes() {
        assert!(Objective::BinaryLogistic.check_label_space(2).is_ok());
        assert!(matches!(
            Objective::BinaryLogistic.check_label_space(3),
            Err(TrainError::ObjectiveMismatch { n_classes: 3, .. })
        ));
        assert!(Objective::MultiSoftmax.check_label_space(1).is_err());
        assert!(Objective::MultiSoftprob.check_label_space(3).is_ok());
    }

    #[test]
    fn serde_uses_cli_names() {
        let json = serde_json::to_string(&Objective::MultiSoftmax).unwrap();
        assert_eq!(json, "\"multi:softmax\"");
    }
}
