//! Class breaks for graduated symbology
//!
//! Every method returns class upper bounds in ascending order, with
//! duplicates removed and the last break equal to the maximum value.
//! NaN and infinite values are ignored. Fewer distinct values than
//! requested classes yields fewer breaks.

use coopaccess_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Largest input the exact Jenks optimisation runs on.
///
/// Bigger inputs are reduced to an evenly spaced sample of the sorted
/// values (always keeping the minimum and maximum), as desktop GIS
/// tools do to keep the O(k·n²) search bounded.
pub const MAX_JENKS_VALUES: usize = 3000;

/// Method used to place class breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMode {
    /// Natural breaks (Jenks)
    #[default]
    Jenks,
    /// Equal number of values per class
    Quantile,
    /// Equal-width classes between min and max
    EqualInterval,
}

impl ClassificationMode {
    pub fn name(&self) -> &'static str {
        match self {
            ClassificationMode::Jenks => "jenks",
            ClassificationMode::Quantile => "quantile",
            ClassificationMode::EqualInterval => "equal_interval",
        }
    }
}

/// Compute class breaks with the given method.
///
/// # Errors
/// `InvalidParameter` when `num_classes` is zero.
pub fn class_breaks(
    values: &[f64],
    num_classes: usize,
    mode: ClassificationMode,
) -> Result<Vec<f64>> {
    match mode {
        ClassificationMode::Jenks => jenks_breaks(values, num_classes),
        ClassificationMode::Quantile => quantile_breaks(values, num_classes),
        ClassificationMode::EqualInterval => equal_interval_breaks(values, num_classes),
    }
}

fn check_classes(num_classes: usize) -> Result<()> {
    if num_classes == 0 {
        return Err(Error::invalid_parameter(
            "num_classes",
            num_classes,
            "at least one class is required",
        ));
    }
    Ok(())
}

fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn finish(mut breaks: Vec<f64>, max: f64) -> Vec<f64> {
    if let Some(last) = breaks.last_mut() {
        *last = max;
    }
    breaks.dedup();
    breaks
}

/// Jenks natural breaks.
///
/// Minimises the summed within-class squared deviation using Fisher's
/// dynamic programme over the sorted values.
pub fn jenks_breaks(values: &[f64], num_classes: usize) -> Result<Vec<f64>> {
    check_classes(num_classes)?;
    let sorted = sorted_finite(values);
    let Some(&max) = sorted.last() else {
        return Ok(Vec::new());
    };

    let mut distinct = sorted.clone();
    distinct.dedup();
    if distinct.len() <= num_classes {
        // One class per distinct value
        return Ok(distinct);
    }

    let data = if sorted.len() > MAX_JENKS_VALUES {
        systematic_sample(&sorted, MAX_JENKS_VALUES)
    } else {
        sorted
    };

    Ok(finish(fisher_jenks(&data, num_classes), max))
}

fn systematic_sample(sorted: &[f64], size: usize) -> Vec<f64> {
    let n = sorted.len();
    (0..size).map(|i| sorted[i * (n - 1) / (size - 1)]).collect()
}

/// Fisher's exact optimisation. Tables are 1-based: row `l` describes the
/// first `l` values, column `j` a split into `j` classes.
fn fisher_jenks(data: &[f64], k: usize) -> Vec<f64> {
    let n = data.len();
    let mut lower_limits = vec![vec![0usize; k + 1]; n + 1];
    let mut variances = vec![vec![0.0f64; k + 1]; n + 1];

    for j in 1..=k {
        lower_limits[1][j] = 1;
        for row in variances.iter_mut().skip(2) {
            row[j] = f64::INFINITY;
        }
    }

    for l in 2..=n {
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut variance = 0.0;

        for m in 1..=l {
            let lower = l - m + 1;
            let val = data[lower - 1];
            sum += val;
            sum_sq += val * val;
            variance = sum_sq - sum * sum / m as f64;

            let prev = lower - 1;
            if prev != 0 {
                for j in 2..=k {
                    let candidate = variance + variances[prev][j - 1];
                    if variances[l][j] >= candidate {
                        lower_limits[l][j] = lower;
                        variances[l][j] = candidate;
                    }
                }
            }
        }

        lower_limits[l][1] = 1;
        variances[l][1] = variance;
    }

    // Walk back from the last value; each class start gives the upper
    // bound of the class before it.
    let mut breaks = vec![data[n - 1]];
    let mut upper = n;
    for j in (2..=k).rev() {
        let start = lower_limits[upper][j];
        if start < 2 {
            break;
        }
        breaks.push(data[start - 2]);
        upper = start - 1;
    }
    breaks.reverse();
    breaks
}

/// Quantile (equal count) breaks with linear interpolation between
/// neighbouring sorted values.
pub fn quantile_breaks(values: &[f64], num_classes: usize) -> Result<Vec<f64>> {
    check_classes(num_classes)?;
    let sorted = sorted_finite(values);
    let Some(&max) = sorted.last() else {
        return Ok(Vec::new());
    };

    let n = sorted.len();
    let breaks = (1..=num_classes)
        .map(|i| {
            let pos = (n - 1) as f64 * i as f64 / num_classes as f64;
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            let frac = pos - lo as f64;
            sorted[lo] + frac * (sorted[hi] - sorted[lo])
        })
        .collect();

    Ok(finish(breaks, max))
}

/// Equal-width breaks between the minimum and maximum.
pub fn equal_interval_breaks(values: &[f64], num_classes: usize) -> Result<Vec<f64>> {
    check_classes(num_classes)?;
    let sorted = sorted_finite(values);
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Ok(Vec::new());
    };

    let width = (max - min) / num_classes as f64;
    let breaks = (1..=num_classes).map(|i| min + width * i as f64).collect();
    Ok(finish(breaks, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_jenks_three_clusters() {
        let values = [21.0, 1.0, 11.0, 2.0, 22.0, 3.0, 10.0, 12.0, 20.0];
        let breaks = jenks_breaks(&values, 3).unwrap();
        assert_eq!(breaks, vec![3.0, 12.0, 22.0]);
    }

    #[test]
    fn test_jenks_two_clusters_of_scores() {
        let mut values: Vec<f64> = (0..20).map(|i| i as f64 * 0.1).collect();
        values.extend((0..20).map(|i| 80.0 + i as f64 * 0.1));
        let breaks = jenks_breaks(&values, 2).unwrap();

        assert_eq!(breaks.len(), 2);
        assert_relative_eq!(breaks[0], 1.9, epsilon = 1e-9);
        assert_relative_eq!(breaks[1], 81.9, epsilon = 1e-9);
    }

    #[test]
    fn test_jenks_fewer_distinct_values() {
        let breaks = jenks_breaks(&[7.0, 5.0, 5.0, 7.0, 5.0], 5).unwrap();
        assert_eq!(breaks, vec![5.0, 7.0]);
    }

    #[test]
    fn test_jenks_large_input_is_sampled() {
        let values: Vec<f64> = (0..10_000).map(|i| (i % 100) as f64).collect();
        let breaks = jenks_breaks(&values, 5).unwrap();

        assert_eq!(breaks.len(), 5);
        assert_eq!(*breaks.last().unwrap(), 99.0);
        assert!(breaks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_breaks_ignore_nan() {
        let values = [f64::NAN, 1.0, 2.0, f64::NAN, 3.0, 4.0];
        for mode in [
            ClassificationMode::Jenks,
            ClassificationMode::Quantile,
            ClassificationMode::EqualInterval,
        ] {
            let breaks = class_breaks(&values, 2, mode).unwrap();
            assert_eq!(breaks.len(), 2, "{}", mode.name());
            assert_eq!(*breaks.last().unwrap(), 4.0);
        }
    }

    #[test]
    fn test_quantile_breaks() {
        let values: Vec<f64> = (1..=8).map(f64::from).collect();
        let breaks = quantile_breaks(&values, 4).unwrap();
        assert_eq!(breaks.len(), 4);
        assert_relative_eq!(breaks[0], 2.75, epsilon = 1e-12);
        assert_relative_eq!(breaks[1], 4.5, epsilon = 1e-12);
        assert_relative_eq!(breaks[2], 6.25, epsilon = 1e-12);
        assert_relative_eq!(breaks[3], 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_equal_interval_breaks() {
        let breaks = equal_interval_breaks(&[0.0, 3.0, 10.0], 5).unwrap();
        assert_eq!(breaks, vec![2.0, 4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn test_constant_values_single_break() {
        let values = [42.0; 6];
        for mode in [ClassificationMode::Quantile, ClassificationMode::EqualInterval] {
            assert_eq!(class_breaks(&values, 5, mode).unwrap(), vec![42.0]);
        }
    }

    #[test]
    fn test_empty_and_zero_classes() {
        assert!(jenks_breaks(&[], 5).unwrap().is_empty());
        assert!(matches!(
            quantile_breaks(&[1.0], 0),
            Err(Error::InvalidParameter { .. })
        ));
    }
}
