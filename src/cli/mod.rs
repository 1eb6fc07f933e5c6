//! Command-line parsing for the FODM generator.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting and encoding code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DelayLinearFormula, PhaseConstantFormula, RegisterVersion, Rounding, TimeFactorOrigin,
};
use crate::encode::ProfileOverrides;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "fodm",
    version,
    about = "First-order delay model generator and FODM register encoder"
)]
pub struct Cli {
    /// Log encoder intermediates and per-segment details.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split a high-order delay polynomial into linear segments.
    Fit(FitArgs),
    /// Encode segments from an input CSV into register records.
    Encode(EncodeArgs),
    /// Fit and encode in one go, driven by a TOML run file.
    Run(RunArgs),
    /// Write synthetic encoder input rows as CSV.
    Synth(SynthArgs),
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Take polynomial and segmentation from a TOML run file.
    #[arg(long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Polynomial validity start (seconds since the epoch).
    #[arg(long, allow_hyphen_values = true, required_unless_present = "config")]
    pub start: Option<f64>,

    /// Polynomial validity stop (seconds since the epoch).
    #[arg(long, allow_hyphen_values = true, required_unless_present = "config")]
    pub stop: Option<f64>,

    /// Coefficients, highest degree first, comma separated.
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        required_unless_present = "config"
    )]
    pub coeffs: Vec<f64>,

    /// First boundary; defaults to the polynomial start.
    #[arg(long, allow_hyphen_values = true)]
    pub from: Option<f64>,

    /// Segment length (seconds).
    #[arg(long, default_value_t = 0.01)]
    pub interval: f64,

    /// Number of segments; defaults to as many as fit in the window.
    #[arg(long)]
    pub count: Option<usize>,

    /// Fit by least squares over this many points (two-point fit when absent).
    #[arg(long)]
    pub lsq_points: Option<usize>,

    /// Per-segment samples used to measure the deviation from the polynomial.
    #[arg(long, default_value_t = 16)]
    pub deviation_samples: usize,

    /// Write a `start,stop,slope,intercept` dump of the segments.
    #[arg(long, value_name = "PATH")]
    pub dump: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct EncodeArgs {
    /// Encoder input CSV (see `fodm synth`).
    #[arg(long, short, value_name = "CSV")]
    pub input: PathBuf,

    #[command(flatten)]
    pub outputs: OutputArgs,

    #[command(flatten)]
    pub profile: ProfileArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// TOML run file; falls back to `$FODM_CONFIG`.
    #[arg(long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Write a `start,stop,slope,intercept` dump of the segments.
    #[arg(long, value_name = "PATH")]
    pub dump: Option<PathBuf>,

    #[command(flatten)]
    pub outputs: OutputArgs,

    #[command(flatten)]
    pub profile: ProfileArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Number of rows.
    #[arg(long, short = 'n', default_value_t = 100)]
    pub rows: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV.
    #[arg(long, short, value_name = "CSV")]
    pub output: PathBuf,
}

/// Where encoded records go.
#[derive(Debug, Args, Clone, Default)]
pub struct OutputArgs {
    /// Register records as CSV.
    #[arg(long, short, value_name = "CSV")]
    pub output: Option<PathBuf>,

    /// Register records as JSON.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,

    /// Packed little-endian register image.
    #[arg(long, value_name = "BIN")]
    pub binary: Option<PathBuf>,

    /// Print the first N records.
    #[arg(long, default_value_t = 10)]
    pub show: usize,
}

/// Encoder profile switches; unset switches keep the register version default.
#[derive(Debug, Args, Clone, Default)]
pub struct ProfileArgs {
    #[arg(long, value_enum)]
    pub register_version: Option<RegisterVersion>,

    #[arg(long, value_enum)]
    pub delay_linear: Option<DelayLinearFormula>,

    /// Fold the delay_linear quantisation error into delay_constant.
    #[arg(long, conflicts_with = "no_redistribute")]
    pub redistribute: bool,

    #[arg(long)]
    pub no_redistribute: bool,

    #[arg(long, value_enum)]
    pub phase_constant: Option<PhaseConstantFormula>,

    #[arg(long, value_enum)]
    pub time_factor_origin: Option<TimeFactorOrigin>,

    /// Use -f_ds in the phase terms.
    #[arg(long, conflicts_with = "no_negate_down_shift")]
    pub negate_down_shift: bool,

    #[arg(long)]
    pub no_negate_down_shift: bool,

    #[arg(long, value_enum)]
    pub rounding: Option<Rounding>,
}

impl ProfileArgs {
    pub fn to_overrides(&self) -> ProfileOverrides {
        ProfileOverrides {
            version: self.register_version,
            delay_linear: self.delay_linear,
            redistribute_linear_error: switch(self.redistribute, self.no_redistribute),
            phase_constant: self.phase_constant,
            time_factor_origin: self.time_factor_origin,
            negate_down_shift: switch(self.negate_down_shift, self.no_negate_down_shift),
            rounding: self.rounding,
        }
    }
}

/// `--x` / `--no-x` pair; `None` when neither was given.
fn switch(on: bool, off: bool) -> Option<bool> {
    if on {
        Some(true)
    } else if off {
        Some(false)
    } else {
        None
    }
}
