//! End-to-end scenarios on reference delay polynomials.

use fodm_gen::data::generate_inputs;
use fodm_gen::domain::{
    DelayLinearFormula, HighOrderPolynomial, LinearSegment, PhaseConstantFormula, PhysicalParameters,
    RegisterVersion, Rounding,
};
use fodm_gen::encode::{EncodeInput, Encoder, EncoderProfile, RegisterFields};
use fodm_gen::fit::{FaultKind, FitMode, FitReport, fit_segments, max_abs_deviation, uniform_boundaries};
use fodm_gen::io::read_encoder_inputs;
use fodm_gen::math::horner_precise;
use rand::prelude::*;
use rand::rngs::StdRng;

/// Degree-6 model polynomial, valid on [27, 37).
const POLY_27_37: [f64; 9] = [
    27.0,
    37.0,
    0.0000000000000016765247099798,
    -0.0000000000000777454450817839,
    0.0000000000013703522293644218,
    -0.0000000010937608165606331000,
    0.0000767171471221868880000000,
    1.2203389596567424000000000000,
    -28854.6047841830330000000000000000,
];

/// Degree-5 model polynomial, valid on [10, 30).
const POLY_10_30: [f64; 8] = [
    10.0,
    30.0,
    4.513184775273619937E-17,
    3.016563864250689452E-14,
    1.077965332504251907E-09,
    -7.680455181115336256E-05,
    -1.216193871021531203E+00,
    28887.4980,
];

fn poly_with_window(packed: &[f64], start: f64, stop: f64) -> HighOrderPolynomial {
    let mut p = HighOrderPolynomial::from_packed(packed).unwrap();
    p.start = start;
    p.stop = stop;
    p
}

/// Max |error| and signed error sum over `n` uniformly random sample times.
fn random_sample_error(poly: &HighOrderPolynomial, report: &FitReport, interval: f64, n: usize) -> (f64, f64) {
    let first = report.segments[0].start;
    let last = report.segments[report.segments.len() - 1].stop;
    let mut rng = StdRng::seed_from_u64(2024);

    let mut max_abs = 0.0_f64;
    let mut cumulative = 0.0;
    for _ in 0..n {
        let t = rng.gen_range(first..last);
        let idx = (((t - first) / interval) as usize).min(report.segments.len() - 1);
        let seg = report.segments[idx];
        let expected = horner_precise(&poly.coeffs, t - poly.start).unwrap().to_f64();
        let diff = expected - seg.delay_at(t);
        max_abs = max_abs.max(diff.abs());
        cumulative += diff;
    }
    (max_abs, cumulative)
}

#[test]
fn thousand_ten_ms_segments_fit_the_reference_polynomial() {
    let poly = HighOrderPolynomial::from_packed(&POLY_27_37).unwrap();
    let boundaries = uniform_boundaries(27.0, 0.01, 1000).unwrap();
    let report = fit_segments(&poly, &boundaries, FitMode::LeastSquares { points: 1000 }).unwrap();

    assert!(report.ok());
    assert_eq!(report.segments.len(), 1000);
    assert!(report.degenerate_segments().is_empty());

    let (max_abs, cumulative) = random_sample_error(&poly, &report, 0.01, 2000);
    assert!(max_abs < 1e-8, "max abs error {max_abs}");
    assert!(cumulative.abs() < 1e-7, "cumulative error {cumulative}");
}

#[test]
fn last_boundary_beyond_stop_invalidates_the_fit() {
    let poly = HighOrderPolynomial::from_packed(&POLY_27_37).unwrap();
    let mut boundaries = uniform_boundaries(27.0, 0.01, 1000).unwrap();
    boundaries[1000] = 50.0;
    let report = fit_segments(&poly, &boundaries, FitMode::LeastSquares { points: 1000 }).unwrap();

    assert!(!report.ok());
    assert_eq!(report.segments.len(), 1000);
    assert_eq!(report.faults.len(), 1);
    assert_eq!(report.faults[0].index, 999);
    assert_eq!(report.faults[0].kind, FaultKind::EndsAfterStop);
}

#[test]
fn least_squares_error_is_bounded_on_reference_polynomials() {
    let interval = 1.0 / 128.0;
    let cases = [
        HighOrderPolynomial::from_packed(&POLY_10_30).unwrap(),
        poly_with_window(&POLY_10_30, 0.0, 30.0),
        // constant only
        HighOrderPolynomial::new(10.0, 30.0, vec![0.0, 0.0, 0.0, 0.0, 0.0, 28887.4980]).unwrap(),
        // constant and linear only
        HighOrderPolynomial::new(0.0, 30.0, vec![0.0, 0.0, 0.0, 0.0, 1.807, -55910.224908]).unwrap(),
    ];

    for poly in &cases {
        let boundaries = uniform_boundaries(poly.start, interval, 1000).unwrap();
        let report = fit_segments(poly, &boundaries, FitMode::LeastSquares { points: 1000 }).unwrap();
        assert!(report.ok());

        let (max_abs, cumulative) = random_sample_error(poly, &report, interval, 2000);
        assert!(max_abs < 1e-8, "start={}: max abs error {max_abs}", poly.start);
        assert!(cumulative.abs() < 1e-7, "start={}: cumulative {cumulative}", poly.start);
    }
}

#[test]
fn deviation_shrinks_with_segment_width() {
    let poly = HighOrderPolynomial::from_packed(&POLY_10_30).unwrap();
    let mode = FitMode::LeastSquares { points: 200 };

    let wide = fit_segments(&poly, &uniform_boundaries(10.0, 0.08, 100).unwrap(), mode).unwrap();
    let narrow = fit_segments(&poly, &uniform_boundaries(10.0, 0.02, 400).unwrap(), mode).unwrap();

    let wide_dev = max_abs_deviation(&poly, &wide, 16).unwrap();
    let narrow_dev = max_abs_deviation(&poly, &narrow, 16).unwrap();
    assert!(narrow_dev.max_abs < wide_dev.max_abs / 4.0);
}

#[test]
fn two_point_segments_match_the_polynomial_at_their_ends() {
    let poly = HighOrderPolynomial::from_packed(&POLY_27_37).unwrap();
    let boundaries = uniform_boundaries(27.0, 0.01, 1000).unwrap();
    let report = fit_segments(&poly, &boundaries, FitMode::TwoPoint).unwrap();
    assert!(report.ok());

    for seg in report.segments.iter().step_by(97) {
        for t in [seg.start, seg.stop] {
            let expected = horner_precise(&poly.coeffs, t - poly.start).unwrap().to_f64();
            let got = seg.delay_at(t);
            assert!(
                ((got - expected) / expected).abs() < 1e-10,
                "t={t}: {got} vs {expected}"
            );
        }
    }
}

#[test]
fn segments_outside_the_window_are_rejected() {
    // 1000 × 20 ms on a 10 s polynomial.
    let poly = poly_with_window(&POLY_10_30, 0.0, 10.0);
    let report = fit_segments(
        &poly,
        &uniform_boundaries(0.0, 0.02, 1000).unwrap(),
        FitMode::LeastSquares { points: 1000 },
    )
    .unwrap();
    assert!(!report.ok());

    // Starting at 45 s on a polynomial that starts at 50 s.
    let poly = poly_with_window(&POLY_10_30, 50.0, 60.0);
    let report = fit_segments(
        &poly,
        &uniform_boundaries(45.0, 0.01, 1000).unwrap(),
        FitMode::LeastSquares { points: 1000 },
    )
    .unwrap();
    assert!(!report.ok());
    assert!(report.faults.iter().any(|f| f.kind == FaultKind::StartsBeforeStart));
}

#[test]
fn zero_delay_segment_encodes_to_zero_phase() {
    let params = PhysicalParameters::with_rates(220_000_000, 220_200_960);
    let segment = LinearSegment {
        start: 0.0,
        stop: 0.01,
        slope: 0.0,
        intercept: 0.0,
    };

    for version in [RegisterVersion::V1, RegisterVersion::V2] {
        let record = Encoder::for_version(version).encode(&segment, 0.0, &params).unwrap();
        let f = record.fields();
        assert_eq!(f.phase_linear, 0);
        assert_eq!(f.phase_constant, 0);
        // floor(220_200_960 * 0.01) - 1: both timestamps are floored, not rounded.
        assert_eq!(f.validity_period, 2_202_008);
        assert_eq!(record.to_le_bytes().len(), version.record_len());
    }
}

#[test]
fn fitted_segments_encode_without_failures() {
    let poly = poly_with_window(&POLY_27_37, 1_700_000_000.0, 1_700_000_010.0);
    let boundaries = uniform_boundaries(poly.start, 0.01, 1000).unwrap();
    let report = fit_segments(&poly, &boundaries, FitMode::LeastSquares { points: 100 }).unwrap();
    assert!(report.ok());

    let params = PhysicalParameters {
        freq_down_shift: -198_000_180.0,
        freq_scfo_shift: -180_774.0,
        ..PhysicalParameters::with_rates(220_000_200, 220_200_960)
    };
    let encoder = Encoder::new(EncoderProfile::for_version(RegisterVersion::V2));
    let records: Vec<_> = encoder
        .encode_batch(&report.segments, poly.start, &params)
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(records.len(), 1000);
    for pair in records.windows(2) {
        let (a, b) = (pair[0].fields(), pair[1].fields());
        // Consecutive segments tile the output sample stream.
        assert_eq!(a.first_output_timestamp + u64::from(a.validity_period) + 1, b.first_output_timestamp);
        assert!(b.first_input_timestamp > a.first_input_timestamp);
    }
}

#[test]
fn synthetic_rows_encode_through_csv_ingest() {
    let rows = generate_inputs(50, 11).unwrap();

    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in &rows {
        writer.serialize(row).unwrap();
    }
    let bytes = writer.into_inner().unwrap();
    let ingest = read_encoder_inputs(bytes.as_slice()).unwrap();
    assert!(ingest.row_errors.is_empty());
    assert_eq!(ingest.records.len(), rows.len());

    for version in [RegisterVersion::V1, RegisterVersion::V2] {
        let encoder = Encoder::for_version(version);
        for (row, rec) in rows.iter().zip(&ingest.records) {
            let direct = encoder
                .encode_input(&EncodeInput::from_row(row).unwrap(), &row.params())
                .unwrap();
            let ingested = encoder.encode_input(&rec.input, &rec.params).unwrap();
            let (d, i) = (direct.fields(), ingested.fields());
            assert_eq!(d.first_output_timestamp, i.first_output_timestamp);
            assert_eq!(d.validity_period, i.validity_period);
            assert_eq!(d.output_pps, i.output_pps);
            // 10 ms at 220 200 960 S/s is 2 202 009.6 output samples.
            assert!((2_202_008..=2_202_009).contains(&d.validity_period));
        }
    }
}

/// Four realistic segments (epoch-scale times, 220 MS/s-class rates, non-zero shifts).
const REFERENCE_ROWS: &str = "\
fo_delay_const,fo_delay_linear,fodm_start_t,fodm_stop_t,hodm_start_t,input_sample_rate,output_sample_rate,f_wb,f_as,f_ds,f_scfo\n\
-287654.3125,4.8828125,1700000003450,1700000003460,1700000000000,220012300,220200960,0,0,-594033210,-509382\n\
391002.5,-7.25,850000009990,850000010000,850000000000,220222200,220200960,0,0,-1783799820,172044\n\
12.0625,0.5,720000001000,720000001010,720000001000,220000100,220200960,1500000,-2500,-198000090,-180774\n\
-399999.875,9.9375,989999999500,989999999510,989999999000,220111100,220200960,-3000000,0,-990499950,-404370";

type Expected = (u64, u32, i32, u64, i64, u32, u32, u64);

/// Decimal reference: V1 widths, scaled ratio, redistribution on, full-linear phase, half-even.
const DECIMAL_REFERENCE: [Expected; 4] = [
    (374_020_910_758_979_147, 2_204_386_557, 724_979_493, 2_145_643_774, -4_967_659, 2_202_008, 1_417_674_752, 374_341_632_759_693_312),
    (187_188_872_200_105_885, 131_929_630, -423_815_371, 2_147_690_773, 1_677_713, 2_202_009, 322_961_408, 187_170_818_199_807_590),
    (158_400_072_220_000_102, 2_807_475_986, -201_391_273, 2_145_524_786, -1_787_357, 2_202_008, 2_367_684_608, 158_544_691_420_200_960),
    (217_909_988_889_856_405, 2_524_188_659, -363_897_295, 2_146_607_320, -3_943_475, 2_202_008, 4_026_531_840, 217_998_950_289_899_520),
];

/// `EncoderProfile::for_version(V1)`.
const V1_DEFAULTS: [Expected; 4] = [
    (374_020_910_758_979_147, 2_203_756_122, -246_154_708, 2_145_643_774, -4_967_659, 2_202_008, 1_417_674_752, 374_341_632_759_693_312),
    (187_188_872_200_105_885, 131_928_154, -539_432_799, 2_147_690_773, 1_677_713, 2_202_009, 322_961_408, 187_170_818_199_807_590),
    (158_400_072_220_000_102, 2_807_840_051, 872_887_325, 2_145_524_786, -1_787_357, 2_202_008, 2_367_684_608, 158_544_691_420_200_960),
    (217_909_988_889_856_405, 2_523_352_933, 308_029_672, 2_146_607_320, -3_943_475, 2_202_008, 4_026_531_840, 217_998_950_289_899_520),
];

/// `EncoderProfile::for_version(V2)`.
const V2_DEFAULTS: [Expected; 4] = [
    (374_020_910_758_979_147, 2_203_756_122, 724_979_493, 9_215_469_839_425_664_241, -21_335_933_058_601_231, 2_202_008, 1_417_674_752, 374_341_632_759_693_312),
    (187_188_872_200_105_885, 131_928_154, -423_815_371, 9_224_261_631_958_838_958, 7_205_720_342_911_513, 2_202_009, 322_961_408, 187_170_818_199_807_590),
    (158_400_072_220_000_102, 2_807_840_051, -201_391_273, 9_214_958_787_917_299_491, -7_676_639_405_435_591, 2_202_008, 2_367_684_608, 158_544_691_420_200_960),
    (217_909_988_889_856_405, 2_523_352_933, -363_897_295, 9_219_608_238_384_271_715, -16_937_094_365_999_483, 2_202_008, 4_026_531_840, 217_998_950_289_899_520),
];

fn register_fields(e: Expected) -> RegisterFields {
    RegisterFields {
        first_input_timestamp: e.0,
        delay_constant: e.1,
        phase_constant: e.2,
        delay_linear: e.3,
        phase_linear: e.4,
        validity_period: e.5,
        output_pps: e.6,
        first_output_timestamp: e.7,
    }
}

#[test]
fn encoder_reproduces_reference_register_values() {
    let ingest = read_encoder_inputs(REFERENCE_ROWS.as_bytes()).unwrap();
    assert!(ingest.row_errors.is_empty());
    assert_eq!(ingest.records.len(), 4);

    let decimal_reference = EncoderProfile::for_version(RegisterVersion::V1)
        .with_delay_linear(DelayLinearFormula::ScaledRatio)
        .with_redistribution(true)
        .with_phase_constant(PhaseConstantFormula::FullLinear)
        .with_rounding(Rounding::HalfEven);
    let cases = [
        ("decimal reference", decimal_reference, &DECIMAL_REFERENCE),
        ("v1 defaults", EncoderProfile::for_version(RegisterVersion::V1), &V1_DEFAULTS),
        ("v2 defaults", EncoderProfile::for_version(RegisterVersion::V2), &V2_DEFAULTS),
    ];

    for (name, profile, expected) in cases {
        let encoder = Encoder::new(profile);
        for (rec, want) in ingest.records.iter().zip(expected.iter()) {
            let got = encoder.encode_input(&rec.input, &rec.params).unwrap();
            assert_eq!(got.version(), profile.version);
            assert_eq!(got.fields(), register_fields(*want), "{name}, CSV line {}", rec.line);
        }
    }
}
