//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - loads run files and CSV inputs
//! - runs segment fitting and register encoding
//! - prints summaries and writes the requested outputs

use clap::Parser;
use rayon::prelude::*;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::cli::{Cli, Command, EncodeArgs, FitArgs, OutputArgs, RunArgs, SynthArgs};
use crate::config::{RunConfig, locate};
use crate::domain::HighOrderPolynomial;
use crate::encode::{Encoder, EncoderProfile};
use crate::error::AppError;
use crate::fit::FitMode;
use crate::report::EncodeSummary;

pub mod pipeline;

use pipeline::Segmentation;

/// Entry point for the `fodm` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Encode(args) => handle_encode(args),
        Command::Run(args) => handle_run(args),
        Command::Synth(args) => handle_synth(args),
    }
}

fn init_logging(verbose: bool) -> Result<(), AppError> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::new(2, format!("Failed to install logger: {e}")))
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let (poly, segmentation) = fit_inputs(&args)?;
    let out = pipeline::run_fit(&poly, &segmentation, args.deviation_samples)?;

    println!(
        "{}",
        crate::report::format_fit_summary(&poly, &out.report, segmentation.mode, out.deviation.as_ref())
    );

    if let Some(path) = &args.dump {
        crate::debug::write_segment_dump(path, &poly, &out.report)?;
        info!(path = %path.display(), "wrote segment dump");
    }

    if out.report.ok() {
        Ok(())
    } else {
        Err(AppError::new(3, "Segment fit reported structural faults."))
    }
}

/// Polynomial and segmentation from `--config` or the explicit flags.
fn fit_inputs(args: &FitArgs) -> Result<(HighOrderPolynomial, Segmentation), AppError> {
    if let Some(path) = &args.config {
        let config = RunConfig::load_from_path(path)?;
        let segmentation = Segmentation {
            start: config.boundaries_start(),
            interval: config.segments.interval,
            count: config.segments.count,
            mode: config.segments.fit_mode(),
        };
        return Ok((config.polynomial, segmentation));
    }

    let (Some(start), Some(stop)) = (args.start, args.stop) else {
        return Err(AppError::new(2, "--start and --stop are required without --config."));
    };
    let poly = HighOrderPolynomial::new(start, stop, args.coeffs.clone())?;
    let mode = match args.lsq_points {
        Some(points) => FitMode::LeastSquares { points },
        None => FitMode::TwoPoint,
    };
    let from = args.from.unwrap_or(start);
    let segmentation = match args.count {
        Some(count) => Segmentation {
            start: from,
            interval: args.interval,
            count,
            mode,
        },
        None => Segmentation::covering(&poly, from, args.interval, mode)?,
    };
    Ok((poly, segmentation))
}

fn handle_encode(args: EncodeArgs) -> Result<(), AppError> {
    let profile = args.profile.to_overrides().resolve();
    let ingest = crate::io::load_encoder_inputs(&args.input)?;
    for err in &ingest.row_errors {
        warn!(line = err.line, "skipped input row: {}", err.message);
    }
    info!(
        rows = ingest.rows_read,
        usable = ingest.records.len(),
        "loaded encoder inputs"
    );

    let encoder = Encoder::new(profile);
    let results: Vec<_> = ingest
        .records
        .par_iter()
        .map(|rec| (rec.line, encoder.encode_input(&rec.input, &rec.params)))
        .collect();
    let summary = EncodeSummary::collect(results);

    report_and_write(&summary, &profile, &args.outputs)
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let path = locate(args.config.as_deref()).ok_or_else(|| {
        AppError::new(
            2,
            format!(
                "No run file given (use --config or set {}).",
                crate::config::CONFIG_ENV_VAR
            ),
        )
    })?;
    let config = RunConfig::load_from_path(&path)?;
    info!(path = %path.display(), "loaded run file");

    let profile = config.encoder.merge(args.profile.to_overrides()).resolve();
    let segmentation = Segmentation {
        start: config.boundaries_start(),
        interval: config.segments.interval,
        count: config.segments.count,
        mode: config.segments.fit_mode(),
    };

    let out = pipeline::run_fit_and_encode(
        &config.polynomial,
        &segmentation,
        &config.physical,
        profile,
        16,
    )?;

    println!(
        "{}",
        crate::report::format_fit_summary(
            &config.polynomial,
            &out.fit.report,
            segmentation.mode,
            out.fit.deviation.as_ref()
        )
    );
    if let Some(path) = &args.dump {
        crate::debug::write_segment_dump(path, &config.polynomial, &out.fit.report)?;
    }

    report_and_write(&out.encoded, &out.profile, &args.outputs)
}

fn report_and_write(
    summary: &EncodeSummary,
    profile: &EncoderProfile,
    outputs: &OutputArgs,
) -> Result<(), AppError> {
    println!("{}", crate::report::format_encode_summary(summary, profile));
    print!("{}", crate::report::format_records_table(summary, outputs.show));

    if let Some(path) = &outputs.output {
        crate::io::write_records_csv(path, &summary.records)?;
        info!(path = %path.display(), records = summary.records.len(), "wrote register CSV");
    }
    if let Some(path) = &outputs.json {
        crate::io::write_records_json(path, &summary.records)?;
        info!(path = %path.display(), "wrote register JSON");
    }
    if let Some(path) = &outputs.binary {
        crate::io::write_records_binary(path, &summary.records)?;
        info!(path = %path.display(), "wrote register image");
    }

    if summary.failures.is_empty() {
        Ok(())
    } else {
        Err(AppError::new(
            4,
            format!("{} of {} record(s) failed to encode.", summary.failures.len(), summary.total()),
        ))
    }
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let rows = crate::data::generate_inputs(args.rows, args.seed)?;
    let mut writer = csv::Writer::from_path(&args.output).map_err(|e| {
        AppError::new(2, format!("Failed to create '{}': {e}", args.output.display()))
    })?;
    for row in &rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(2, format!("Failed to write synthetic row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write synthetic rows: {e}")))?;
    info!(rows = rows.len(), path = %args.output.display(), "wrote synthetic inputs");
    Ok(())
}
