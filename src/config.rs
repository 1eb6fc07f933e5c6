//! Run configuration (TOML).
//!
//! A run file describes one fit-and-encode job:
//!
//! ```toml
//! [polynomial]
//! start = 1700000000.0
//! stop = 1700000010.0
//! coeffs = [1.2e-9, -3.4e-5, 0.82, 12345.6]
//!
//! [segments]
//! interval = 0.01
//! count = 1000
//! lsq_points = 1000   # omit for two-point fitting
//!
//! [physical]
//! input_sample_rate = 220000000
//! output_sample_rate = 220200960
//! freq_down_shift = -198000000.0
//!
//! [encoder]
//! version = "v2"
//! rounding = "half-even"
//! ```
//!
//! The file is located via `--config` or the `FODM_CONFIG` environment variable
//! (a `.env` file in the working directory is honoured).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{HighOrderPolynomial, PhysicalParameters};
use crate::encode::ProfileOverrides;
use crate::error::AppError;
use crate::fit::FitMode;

pub const CONFIG_ENV_VAR: &str = "FODM_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub polynomial: HighOrderPolynomial,
    pub segments: SegmentationConfig,
    pub physical: PhysicalParameters,
    #[serde(default)]
    pub encoder: ProfileOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentationConfig {
    /// First boundary (seconds since the epoch); defaults to the polynomial start.
    pub start: Option<f64>,
    /// Segment length in seconds.
    pub interval: f64,
    pub count: usize,
    /// Least-squares sample count; two-point fitting when absent.
    pub lsq_points: Option<usize>,
}

impl SegmentationConfig {
    pub fn fit_mode(&self) -> FitMode {
        match self.lsq_points {
            Some(points) => FitMode::LeastSquares { points },
            None => FitMode::TwoPoint,
        }
    }
}

impl RunConfig {
    pub fn load_from_path(path: &Path) -> Result<Self, AppError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AppError::new(2, format!("Failed to read config '{}': {e}", path.display()))
        })?;
        Self::parse(&contents)
            .map_err(|e| AppError::new(2, format!("Invalid config '{}': {e}", path.display())))
    }

    pub fn parse(contents: &str) -> Result<Self, AppError> {
        let config: RunConfig =
            toml::from_str(contents).map_err(|e| AppError::new(2, e.to_string()))?;
        config.polynomial.validate()?;
        Ok(config)
    }

    pub fn boundaries_start(&self) -> f64 {
        self.segments.start.unwrap_or(self.polynomial.start)
    }
}

/// Resolve the config path: an explicit path wins over `FODM_CONFIG`.
pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    dotenvy::dotenv().ok();
    std::env::var_os(CONFIG_ENV_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
