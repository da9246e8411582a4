//! Window primitives shared by the indicators.
//!
//! Both use a minimum of one observation: a window with at least one
//! defined value produces a value, so early rows are never undefined.

/// Rolling mean over `window` rows, min-periods 1. NaN inputs are skipped;
/// a window with no defined value yields NaN.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return vec![f64::NAN; values.len()];
    }

    // Each window is summed from its own rows so a flat stretch averages
    // to exactly its value.
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let (sum, count) = values[start..=i]
                .iter()
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(s, c), &v| (s + v, c + 1));
            if count > 0 {
                sum / count as f64
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Exponentially weighted mean with span `span` (alpha = 2 / (span + 1)),
/// adjust off, min-periods 1.
///
/// The first defined value seeds the average. A NaN input carries the
/// previous average forward.
pub fn ewm_mean(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev: Option<f64> = None;
    values
        .iter()
        .map(|&v| {
            if !v.is_nan() {
                prev = Some(match prev {
                    None => v,
                    Some(p) => alpha * v + (1.0 - alpha) * p,
                });
            }
            prev.unwrap_or(f64::NAN)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn rolling_mean_partial_windows() {
        let r = rolling_mean(&[2.0, 4.0, 6.0, 8.0], 3);
        assert_approx(r[0], 2.0, DEFAULT_EPSILON);
        assert_approx(r[1], 3.0, DEFAULT_EPSILON);
        assert_approx(r[2], 4.0, DEFAULT_EPSILON);
        assert_approx(r[3], 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_mean_skips_nan() {
        let r = rolling_mean(&[f64::NAN, 4.0, f64::NAN, 8.0], 2);
        assert!(r[0].is_nan());
        assert_approx(r[1], 4.0, DEFAULT_EPSILON);
        assert_approx(r[2], 4.0, DEFAULT_EPSILON);
        assert_approx(r[3], 8.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_mean_flat_window_after_movement_is_exact() {
        let mut values = vec![0.11, 0.0, 0.27, 0.0, 0.13, 0.0, 0.31];
        values.extend(std::iter::repeat(0.0).take(5));
        let r = rolling_mean(&values, 3);
        for &v in &r[9..] {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn ewm_seed_is_first_value() {
        // alpha = 0.5
        let r = ewm_mean(&[10.0, 12.0, 14.0], 3);
        assert_approx(r[0], 10.0, DEFAULT_EPSILON);
        assert_approx(r[1], 11.0, DEFAULT_EPSILON);
        assert_approx(r[2], 12.5, DEFAULT_EPSILON);
    }

    #[test]
    fn ewm_carries_over_nan() {
        let r = ewm_mean(&[f64::NAN, 10.0, f64::NAN, 14.0], 3);
        assert!(r[0].is_nan());
        assert_approx(r[1], 10.0, DEFAULT_EPSILON);
        assert_approx(r[2], 10.0, DEFAULT_EPSILON);
        assert_approx(r[3], 12.0, DEFAULT_EPSILON);
    }
}
