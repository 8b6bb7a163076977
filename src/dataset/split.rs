use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

use super::table::{EncodedLabels, FeatureTable};

/// Train/test partitions produced by [`split`]; each pair is row-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct Partitions {
    pub x_train: FeatureTable,
    pub x_test: FeatureTable,
    pub y_train: EncodedLabels,
    pub y_test: EncodedLabels,
}

/// Reasons a stratified split cannot be produced.
#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("Test fraction must be within (0, 1), got {0}")]
    InvalidFraction(f64),
    #[error("Features ({features} rows) and labels ({labels} rows) are not row-aligned")]
    Misaligned { features: usize, labels: usize },
    #[error("Label code {code} is outside the label space of {n_classes} classes")]
    CodeOutOfRange { code: usize, n_classes: usize },
    #[error("Class {code} has no rows left to split; was it removed while cleaning?")]
    EmptyClass { code: usize },
    #[error("Class {code} has {count} row(s); at least 2 are needed to stratify")]
    TooFewMembers { code: usize, count: usize },
}

/// Stratified random split that keeps each class's share in both partitions.
///
/// Every class in `0..labels.n_classes` must have at least two rows, so a
/// class that cleaning removed entirely fails here instead of yielding a
/// partition without it.
pub fn split(
    features: &FeatureTable,
    labels: &EncodedLabels,
    test_fraction: f64,
    seed: u64,
) -> Result<Partitions, SplitError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(SplitError::InvalidFraction(test_fraction));
    }
    if features.len() != labels.len() || features.index != labels.index {
        return Err(SplitError::Misaligned {
            features: features.len(),
            labels: labels.len(),
        });
    }
    if let Some(&code) = labels.codes.iter().find(|&&code| code >= labels.n_classes) {
        return Err(SplitError::CodeOutOfRange {
            code,
            n_classes: labels.n_classes,
        });
    }
    let counts = labels.class_counts();
    for (code, &count) in counts.iter().enumerate() {
        match count {
            0 => return Err(SplitError::EmptyClass { code }),
            1 => return Err(SplitError::TooFewMembers { code, count }),
            _ => {}
        }
    }

    let n = labels.len();
    let target = ((test_fraction * n as f64) - 1e-9).ceil() as usize;
    let allocation = allocate_test_rows(&counts, test_fraction, target);

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let mut taken = vec![0usize; counts.len()];
    let mut train = Vec::with_capacity(n);
    let mut test = Vec::with_capacity(target);
    for pos in order {
        let code = labels.codes[pos];
        if taken[code] < allocation[code] {
            taken[code] += 1;
            test.push(pos);
        } else {
            train.push(pos);
        }
    }

    Ok(Partitions {
        x_train: features.take(&train),
        x_test: features.take(&test),
        y_train: labels.take(&train),
        y_test: labels.take(&test),
    })
}

/// Per-class test row counts summing as close to `target` as the
/// one-row-per-partition floor allows.
fn allocate_test_rows(counts: &[usize], fraction: f64, target: usize) -> Vec<usize> {
    let mut allocation = Vec::with_capacity(counts.len());
    let mut remainders = Vec::with_capacity(counts.len());
    for &count in counts {
        let exact = count as f64 * fraction;
        allocation.push((exact.floor() as usize).clamp(1, count - 1));
        remainders.push(exact - exact.floor());
    }

    let mut total: usize = allocation.iter().sum();
    while total < target {
        let Some(k) = (0..counts.len())
            .filter(|&k| allocation[k] + 1 < counts[k])
            .max_by(|&a, &b| remainders[a].total_cmp(&remainders[b]).then(b.cmp(&a)))
        else {
            break;
        };
        allocation[k] += 1;
        remainders[k] -= 1.0;
        total += 1;
    }
    while total > target {
        let Some(k) = (0..counts.len())
            .filter(|&k| allocation[k] > 1)
            .min_by(|&a, &b| remainders[a].total_cmp(&remainders[b]))
        else {
            break;
        };
        allocation[k] -= 1;
        remainders[k] += 1.0;
        total -= 1;
    }
    allocation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(class_sizes: &[usize]) -> (FeatureTable, EncodedLabels) {
        let mut rows = Vec::new();
        let mut codes = Vec::new();
        for (code, &size) in class_sizes.iter().enumerate() {
            for i in 0..size {
                rows.push(vec![Some(code as f64 * 100.0 + i as f64)]);
                codes.push(code);
            }
        }
        let index: Vec<usize> = (0..rows.len()).collect();
        let features = FeatureTable::new(vec!["f0".into()], index.clone(), rows).unwrap();
        let labels = EncodedLabels {
            name: "species".into(),
            index,
            codes,
            n_classes: class_sizes.len(),
        };
        (features, labels)
    }

    #[test]
    fn preserves_class_proportions() {
        let (x, y) = dataset(&[146, 68, 119]);
        let parts = split(&x, &y, 0.3, 42).unwrap();

        assert_eq!(parts.x_test.len(), 100);
        assert_eq!(parts.x_train.len(), 233);
        assert_eq!(parts.y_test.class_counts(), vec![44, 20, 36]);
        assert_eq!(parts.y_train.class_counts(), vec![102, 48, 83]);
    }

    #[test]
    fn partitions_are_disjoint_aligned_and_complete() {
        let (x, y) = dataset(&[20, 15, 10]);
        let parts = split(&x, &y, 0.25, 7).unwrap();

        assert_eq!(parts.x_train.index, parts.y_train.index);
        assert_eq!(parts.x_test.index, parts.y_test.index);
        let mut all: Vec<usize> = parts
            .x_train
            .index
            .iter()
            .chain(parts.x_test.index.iter())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..45).collect::<Vec<_>>());
        for (row, &code) in parts.x_test.rows.iter().zip(&parts.y_test.codes) {
            let value = row[0].unwrap();
            assert_eq!((value / 100.0).floor() as usize, code);
        }
    }

    #[test]
    fn fixed_seed_is_deterministic() {
        let (x, y) = dataset(&[30, 30, 30]);
        let first = split(&x, &y, 0.3, 42).unwrap();
        let second = split(&x, &y, 0.3, 42).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first.x_test).unwrap(),
            serde_json::to_vec(&second.x_test).unwrap()
        );

        let other = split(&x, &y, 0.3, 43).unwrap();
        assert_ne!(first.x_test.index, other.x_test.index);
    }

    #[test]
    fn empty_class_fails_loudly() {
        let (x, mut y) = dataset(&[10, 10]);
        y.n_classes = 3;
        assert_eq!(split(&x, &y, 0.3, 42), Err(SplitError::EmptyClass { code: 2 }));
    }

    #[test]
    fn singleton_class_cannot_be_stratified() {
        let (x, y) = dataset(&[10, 1, 10]);
        assert_eq!(
            split(&x, &y, 0.3, 42),
            Err(SplitError::TooFewMembers { code: 1, count: 1 })
        );
    }

    #[test]
    fn fraction_must_be_open_interval() {
        let (x, y) = dataset(&[10, 10]);
        for fraction in [0.0, 1.0, -0.5, f64::NAN] {
            assert!(matches!(
                split(&x, &y, fraction, 42),
                Err(SplitError::InvalidFraction(_))
            ));
        }
    }

    #[test]
    fn tiny_classes_keep_one_row_each_side() {
        let (x, y) = dataset(&[2, 2, 2]);
        let parts = split(&x, &y, 0.9, 1).unwrap();
        assert_eq!(parts.y_test.class_counts(), vec![1, 1, 1]);
        assert_eq!(parts.y_train.class_counts(), vec![1, 1, 1]);
    }
}
