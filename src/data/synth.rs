//! Synthetic encoder inputs.
//!
//! Produces rows in the ingest CSV schema with realistic magnitudes:
//!
//! - delay constant within ±400 µs, delay rate within ±10 ns/s
//! - input rate `220 MS/s + k·100 S/s`, output rate 220 200 960 S/s
//! - down-conversion and SCFO shifts derived from a frequency slice index 1..=9
//! - HO polynomial starting on a whole second between 720e6 and 990e6 s after
//!   the epoch, FO segments 10 ms long on the 10 ms grid inside its first 10 s
//!
//! The same seed always yields the same rows.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Uniform;

use crate::domain::EncoderInputRow;
use crate::error::AppError;

pub const OUTPUT_SAMPLE_RATE: u32 = 220_200_960;
const SEGMENT_MS: f64 = 10.0;

pub fn generate_inputs(rows: usize, seed: u64) -> Result<Vec<EncoderInputRow>, AppError> {
    if rows == 0 {
        return Err(AppError::new(2, "Row count must be >= 1."));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let delay_const = Uniform::new_inclusive(-400_000.0, 400_000.0);
    let delay_rate = Uniform::new_inclusive(-10.0, 10.0);

    let out = (0..rows)
        .map(|_| {
            let input_rate = 220_000_000 + 100 * rng.gen_range(1..=2222u32);
            let slice = f64::from(rng.gen_range(1..=9u32));
            let ho_start_s = rng.gen_range(720_000_000u64..=990_000_000);
            let ho_start_ms = (ho_start_s * 1000) as f64;
            let fo_start_ms = ho_start_ms + SEGMENT_MS * f64::from(rng.gen_range(0..1000u32));

            let rate_diff = f64::from(input_rate) - f64::from(OUTPUT_SAMPLE_RATE);
            EncoderInputRow {
                fo_delay_const: delay_const.sample(&mut rng),
                fo_delay_linear: delay_rate.sample(&mut rng),
                fodm_start_t: fo_start_ms,
                fodm_stop_t: fo_start_ms + SEGMENT_MS,
                hodm_start_t: ho_start_ms,
                input_sample_rate: input_rate,
                output_sample_rate: OUTPUT_SAMPLE_RATE,
                f_wb: 0.0,
                f_as: 0.0,
                f_ds: (-0.9 * slice * f64::from(input_rate)).round(),
                f_scfo: (0.9 * slice * rate_diff).round(),
            }
        })
        .collect();
    Ok(out)
}
