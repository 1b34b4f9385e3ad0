//! Series derivations used by the chart builders, powered by the `ta` crate
//!
//! Every input is a column with gaps (`None`). Windowed indicators restart on
//! each gap, so a value is only produced once a full window of present values
//! has been seen, matching pandas' `rolling(n)` with the default `min_periods`.

use itertools::{EitherOrBoth, Itertools};
use serde::{Deserialize, Serialize};
use ta::indicators::{BollingerBands as TaBB, SimpleMovingAverage};
use ta::{Next, Reset};

/// Type alias for band indicators (upper, middle, lower)
pub type BandOutput = (Vec<Option<f64>>, Vec<Option<f64>>, Vec<Option<f64>>);

/// Default Bollinger window and width
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STD: f64 = 2.0;

// =============================================================================
// Moving Averages
// =============================================================================

/// Rolling mean over `period` points, `None` until the window is full
pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let mut indicator = match SimpleMovingAverage::new(period) {
        Ok(i) => i,
        Err(_) => return vec![None; values.len()],
    };

    let mut run = 0usize;
    values
        .iter()
        .map(|value| match value {
            Some(v) => {
                run += 1;
                let mean = indicator.next(*v);
                (run >= period).then_some(mean)
            }
            None => {
                run = 0;
                indicator.reset();
                None
            }
        })
        .collect()
}

// =============================================================================
// Volatility Bands
// =============================================================================

/// Calculate Bollinger Bands (upper, middle, lower)
pub fn bollinger_bands(values: &[Option<f64>], period: usize, num_std: f64) -> BandOutput {
    let len = values.len();
    let empty = || (vec![None; len], vec![None; len], vec![None; len]);

    if period == 0 {
        return empty();
    }

    let mut indicator = match TaBB::new(period, num_std) {
        Ok(i) => i,
        Err(_) => return empty(),
    };

    let mut upper = Vec::with_capacity(len);
    let mut middle = Vec::with_capacity(len);
    let mut lower = Vec::with_capacity(len);
    let mut run = 0usize;

    for value in values {
        match value {
            Some(v) => {
                run += 1;
                let out = indicator.next(*v);
                if run >= period {
                    upper.push(Some(out.upper));
                    middle.push(Some(out.average));
                    lower.push(Some(out.lower));
                } else {
                    upper.push(None);
                    middle.push(None);
                    lower.push(None);
                }
            }
            None => {
                run = 0;
                indicator.reset();
                upper.push(None);
                middle.push(None);
                lower.push(None);
            }
        }
    }

    (upper, middle, lower)
}

// =============================================================================
// Helpers
// =============================================================================

/// Multiply every present value by `factor`
pub fn scale(values: &[Option<f64>], factor: f64) -> Vec<Option<f64>> {
    values.iter().map(|v| v.map(|x| x * factor)).collect()
}

/// True when every value is missing (an empty column counts as missing)
pub fn all_missing(values: &[Option<f64>]) -> bool {
    values.iter().all(|v| v.is_none())
}

// =============================================================================
// IV Percentile Warning Mask
// =============================================================================

/// Percentile bounds outside which the IV percentile is flagged
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IvpBands {
    pub high: f64,
    pub low: f64,
}

impl Default for IvpBands {
    fn default() -> Self {
        IvpBands {
            high: 91.0,
            low: 15.0,
        }
    }
}

impl IvpBands {
    fn is_extreme(&self, value: Option<f64>) -> bool {
        value.is_some_and(|v| v >= self.high || v <= self.low)
    }
}

/// Keep `ivp[i]` where it or its successor is extreme.
///
/// Looking one point ahead keeps the flagged line joined to the point where
/// the percentile enters the extreme zone.
pub fn ivp_warn(ivp: &[Option<f64>], bands: &IvpBands) -> Vec<Option<f64>> {
    ivp.iter()
        .zip_longest(ivp.iter().skip(1))
        .map(|pair| {
            let (current, next) = match pair {
                EitherOrBoth::Both(c, n) => (*c, *n),
                EitherOrBoth::Left(c) => (*c, None),
                EitherOrBoth::Right(n) => (None, *n),
            };
            if bands.is_extreme(current) || bands.is_extreme(next) {
                current
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn present(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_rolling_mean() {
        let result = rolling_mean(&present(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3);

        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_relative_eq!(result[2].unwrap(), 2.0);
        assert_relative_eq!(result[3].unwrap(), 3.0);
        assert_relative_eq!(result[4].unwrap(), 4.0);
    }

    #[test]
    fn test_rolling_mean_restarts_after_gap() {
        let values = vec![Some(1.0), Some(2.0), None, Some(3.0), Some(5.0), Some(7.0)];
        let result = rolling_mean(&values, 2);

        assert_eq!(result[0], None);
        assert_relative_eq!(result[1].unwrap(), 1.5);
        assert_eq!(result[2], None);
        assert_eq!(result[3], None);
        assert_relative_eq!(result[4].unwrap(), 4.0);
        assert_relative_eq!(result[5].unwrap(), 6.0);
    }

    #[test]
    fn test_rolling_mean_zero_period() {
        assert_eq!(rolling_mean(&present(&[1.0, 2.0]), 0), vec![None, None]);
    }

    #[test]
    fn test_bollinger_bands_constant_series() {
        let values = present(&[10.0; 25]);
        let (upper, middle, lower) = bollinger_bands(&values, BOLLINGER_PERIOD, BOLLINGER_STD);

        assert_eq!(upper.len(), 25);
        assert!(middle[18].is_none());
        assert_relative_eq!(middle[19].unwrap(), 10.0);
        assert_relative_eq!(upper[24].unwrap(), 10.0);
        assert_relative_eq!(lower[24].unwrap(), 10.0);
    }

    #[test]
    fn test_bollinger_bands_width() {
        let values = present(&[1.0, 3.0, 1.0, 3.0]);
        let (upper, middle, lower) = bollinger_bands(&values, 2, 2.0);

        // population std of [1, 3] is 1
        assert_relative_eq!(middle[1].unwrap(), 2.0);
        assert_relative_eq!(upper[1].unwrap(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(lower[1].unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_scale_keeps_gaps() {
        assert_eq!(
            scale(&[Some(0.25), None], 100.0),
            vec![Some(25.0), None]
        );
    }

    #[test]
    fn test_ivp_warn_marks_extremes_and_predecessors() {
        let ivp = vec![Some(50.0), Some(60.0), Some(95.0), Some(70.0), Some(10.0), None];
        let warn = ivp_warn(&ivp, &IvpBands::default());

        assert_eq!(
            warn,
            vec![None, Some(60.0), Some(95.0), Some(70.0), Some(10.0), None]
        );
    }

    #[test]
    fn test_ivp_warn_inclusive_bounds() {
        let ivp = vec![Some(91.0), Some(50.0), Some(50.0), Some(15.0)];
        let warn = ivp_warn(&ivp, &IvpBands::default());
        assert_eq!(warn, vec![Some(91.0), None, Some(50.0), Some(15.0)]);
    }

    #[test]
    fn test_all_missing() {
        assert!(all_missing(&[None, None]));
        assert!(all_missing(&[]));
        assert!(!all_missing(&[None, Some(0.2)]));
    }
}
