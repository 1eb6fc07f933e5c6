//! Segment boundary generation.
//!
//! Delay models are normally split into equally long pieces (10 ms is typical),
//! so the common case is a uniform grid anchored at the first FO start time.

use crate::error::AppError;

/// `count + 1` boundaries `start + k * interval`, `k = 0..=count`.
pub fn uniform_boundaries(start: f64, interval: f64, count: usize) -> Result<Vec<f64>, AppError> {
    if !(start.is_finite() && interval.is_finite() && interval > 0.0) {
        return Err(AppError::new(
            2,
            format!(
                "Invalid segmentation: start={start}, interval={interval} (must be finite, interval>0)."
            ),
        ));
    }
    if count == 0 {
        return Err(AppError::new(2, "Segment count must be >= 1."));
    }

    Ok((0..=count).map(|k| start + interval * k as f64).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_grid_has_count_plus_one_points() {
        let b = uniform_boundaries(27.0, 0.01, 1000).unwrap();
        assert_eq!(b.len(), 1001);
        assert_eq!(b[0], 27.0);
        assert!((b[1000] - 37.0).abs() < 1e-9);
        assert!(b.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn rejects_degenerate_grids() {
        assert!(uniform_boundaries(0.0, 0.0, 10).is_err());
        assert!(uniform_boundaries(0.0, -1.0, 10).is_err());
        assert!(uniform_boundaries(f64::NAN, 1.0, 10).is_err());
        assert!(uniform_boundaries(0.0, 1.0, 0).is_err());
    }
}
