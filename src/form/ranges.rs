//! Input bounds for the numeric form fields.
//!
//! A field spans the observed values widened by one standard deviation on
//! each side, with both ends rounded to two significant figures of their own
//! magnitude. The step is one unit of the second significant figure of the
//! midpoint.

use thiserror::Error;

/// Bounds and step for one numeric input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl FieldRange {
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Series the heuristic cannot bound.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldRangeError {
    #[error("No values to derive a range from")]
    Empty,
    #[error("Value {value} is not finite")]
    NonFinite { value: f64 },
    #[error("Values must be positive, found minimum {min}")]
    NonPositive { min: f64 },
    #[error("Range ({min}, {max}) has no positive midpoint")]
    Degenerate { min: f64, max: f64 },
}

/// Derive the input range for one feature column.
pub fn range_for(series: &[f64]) -> Result<FieldRange, FieldRangeError> {
    if series.is_empty() {
        return Err(FieldRangeError::Empty);
    }
    if let Some(&value) = series.iter().find(|v| !v.is_finite()) {
        return Err(FieldRangeError::NonFinite { value });
    }
    let lo = series.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo <= 0.0 {
        return Err(FieldRangeError::NonPositive { min: lo });
    }

    let s = population_std(series);
    let min = round_to_magnitude((lo - s).max(0.0));
    let max = round_to_magnitude(hi + s);
    let mid = (min + max) / 2.0;
    if mid <= 0.0 {
        return Err(FieldRangeError::Degenerate { min, max });
    }
    Ok(FieldRange {
        min,
        max,
        step: 10f64.powi(magnitude_digits(mid) - 2),
    })
}

fn population_std(series: &[f64]) -> f64 {
    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;
    let var = series.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}

/// `trunc(log10(x)) + 1` for positive `x`; digits of the integer part when
/// `x >= 1`.
pub fn magnitude_digits(x: f64) -> i32 {
    if x >= 1.0 && x < u64::MAX as f64 {
        let mut n = x.trunc() as u64;
        let mut digits = 0;
        while n > 0 {
            digits += 1;
            n /= 10;
        }
        digits
    } else {
        x.log10().trunc() as i32 + 1
    }
}

/// Round the integer part of `x` half-up to a multiple of
/// `10^(magnitude_digits(x) - 2)`. Non-positive input gives `0`.
pub fn round_to_magnitude(x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let whole = x.trunc();
    let exp = magnitude_digits(x) - 2;
    if exp <= 0 {
        return whole;
    }
    let unit = 10f64.powi(exp);
    (whole / unit + 0.5).floor() * unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn ten_twenty_thirty() {
        let range = range_for(&[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(
            range,
            FieldRange {
                min: 1.0,
                max: 38.0,
                step: 1.0
            }
        );
    }

    #[test]
    fn penguin_body_mass_scale() {
        let range = range_for(&[2700.0, 3800.0, 4200.0, 6300.0]).unwrap();
        assert_eq!(range.min % 100.0, 0.0);
        assert_eq!(range.max % 100.0, 0.0);
        assert!(range.min < 2700.0 && range.max > 6300.0);
        assert_eq!(range.step, 100.0);
    }

    #[test]
    fn rounds_to_two_significant_figures() {
        assert_eq!(round_to_magnitude(38.16), 38.0);
        assert_eq!(round_to_magnitude(1.84), 1.0);
        assert_eq!(round_to_magnitude(234.9), 230.0);
        assert_eq!(round_to_magnitude(235.0), 240.0);
        assert_eq!(round_to_magnitude(995.0), 1000.0);
        assert_eq!(round_to_magnitude(0.4), 0.0);
        assert_eq!(round_to_magnitude(-3.0), 0.0);
    }

    #[test]
    fn digits_follow_log10() {
        assert_eq!(magnitude_digits(1.0), 1);
        assert_eq!(magnitude_digits(9.99), 1);
        assert_eq!(magnitude_digits(10.0), 2);
        assert_eq!(magnitude_digits(1000.0), 4);
        assert_eq!(magnitude_digits(0.5), 1);
        assert_eq!(magnitude_digits(0.05), 0);
    }

    #[test]
    fn wide_spread_clamps_lower_bound_to_zero() {
        let range = range_for(&[1.0, 1.0, 1.0, 100.0]).unwrap();
        assert_eq!(range.min, 0.0);
        assert!(range.max > 100.0);
    }

    #[test]
    fn rejects_unusable_series() {
        assert_eq!(range_for(&[]), Err(FieldRangeError::Empty));
        assert_eq!(
            range_for(&[1.0, 0.0]),
            Err(FieldRangeError::NonPositive { min: 0.0 })
        );
        assert!(matches!(
            range_for(&[1.0, f64::NAN]),
            Err(FieldRangeError::NonFinite { .. })
        ));
        assert!(matches!(
            range_for(&[0.1, 0.2]),
            Err(FieldRangeError::Degenerate { .. })
        ));
    }

    #[test]
    fn bounds_are_ordered_round_multiples() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let len = rng.random_range(1..20);
            let scale = 10f64.powi(rng.random_range(0..5));
            let series: Vec<f64> = (0..len)
                .map(|_| 1.0 + rng.random::<f64>() * scale)
                .collect();

            let range = range_for(&series).unwrap();

            assert!(range.min <= range.max, "{series:?} -> {range:?}");
            assert!(range.step > 0.0);
            for bound in [range.min, range.max] {
                assert!(bound >= 0.0);
                assert_eq!(bound.fract(), 0.0);
                if bound > 0.0 {
                    let unit = 10f64.powi((magnitude_digits(bound) - 2).max(0));
                    assert_eq!((bound / unit).fract(), 0.0, "{bound} not a multiple of {unit}");
                }
            }
        }
    }
}
