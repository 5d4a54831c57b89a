//! End-to-end scenarios on small synthetic mobility tables.
//!
//! Run: cargo test --test scenarios

use std::path::PathBuf;

use nltsa_core::{
    analyze, column_key, compare_methods, complexity_resonance, cumulative_complexity_peaks,
    distribution_uniformity, fluctuation_intensity, is_missing, scale_columns, summarize_windows,
    AnalysisConfig, DataMatrix, DecompositionMethod, FeatureRange, NltsaError, SummarizerOptions,
    TimeFrame, WindowFailurePolicy,
};

// ─── Helpers ────────────────────────────────────────────────────────────────

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn labels(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("2020-03-{:02}", i + 1))
        .collect()
}

fn assert_vec_close(actual: &[f64], expected: &[f64], tol: f64, label: &str) {
    assert_eq!(actual.len(), expected.len(), "{}: length mismatch", label);
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            (a - e).abs() < tol,
            "{} [{}]: got {:.12}, expected {:.12}",
            label,
            i,
            a,
            e
        );
    }
}

fn bits(frame: &TimeFrame) -> Vec<u64> {
    frame.values().as_slice().iter().map(|v| v.to_bits()).collect()
}

/// Two series alternating between 0 and 1 in opposite phase.
fn alternating(n: usize) -> TimeFrame {
    TimeFrame::from_series(
        labels(n),
        vec![
            ("A".to_string(), (0..n).map(|i| Some((i % 2) as f64)).collect()),
            ("B".to_string(), (0..n).map(|i| Some(((i + 1) % 2) as f64)).collect()),
        ],
    )
    .unwrap()
}

/// Three series with daily and weekly structure; `C` has a gap on rows 5..=9.
fn with_gap() -> TimeFrame {
    let n = 15;
    let series = ["A", "B", "C"]
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let values = (0..n)
                .map(|i| {
                    if j == 2 && (5..=9).contains(&i) {
                        None
                    } else {
                        Some(50.0 + 20.0 * ((i * (j + 2)) % 7) as f64)
                    }
                })
                .collect();
            (name.to_string(), values)
        })
        .collect();
    TimeFrame::from_series(labels(n), series).unwrap()
}

/// A wide table shaped like the Apple mobility export for two cities.
fn mobility_table(n: usize) -> TimeFrame {
    let keys = [
        ("Finland", "Helsinki", "driving"),
        ("Finland", "Helsinki", "walking"),
        ("Finland", "Helsinki", "transit"),
        ("Sweden", "Stockholm", "driving"),
    ];
    let series = keys
        .iter()
        .enumerate()
        .map(|(j, (country, region, mode))| {
            let values = (0..n)
                .map(|i| {
                    let t = i as f64;
                    let weekly = (2.0 * std::f64::consts::PI * t / 7.0).sin();
                    let lockdown = if i > n / 2 { 0.5 } else { 1.0 };
                    Some(100.0 * lockdown + 15.0 * weekly * (1.0 + 0.3 * j as f64) + (i % 3) as f64)
                })
                .collect();
            (column_key(&[country, region, mode]), values)
        })
        .collect();
    TimeFrame::from_series(labels(n), series).unwrap()
}

// ─── Alternating series ─────────────────────────────────────────────────────

#[test]
fn test_alternating_series_fluctuate_fully() {
    let frame = alternating(20);
    let range = FeatureRange::default();
    let scaled = scale_columns(&frame, Some(range)).unwrap();
    let fi = fluctuation_intensity(&scaled, 7, range, 1, 2).unwrap();

    assert_eq!(fi.nrows(), 14);
    assert_eq!(fi.index()[0], "2020-03-07");
    for j in 0..2 {
        assert_vec_close(fi.values().column(j), &[1.0; 14], 1e-12, "fi");
    }

    // resonance with an all-ones uniformity reproduces the fluctuation
    let ones = TimeFrame::new(
        fi.index().to_vec(),
        fi.columns().to_vec(),
        DataMatrix::from_column_major(vec![1.0; 28], 14, 2).unwrap(),
    )
    .unwrap();
    let resonance = complexity_resonance(&fi, &ones).unwrap();
    assert_eq!(resonance, fi);

    // constant step-wise complexity: zero spread, no peaks
    let peaks = cumulative_complexity_peaks(&resonance, 1.0).unwrap();
    assert_eq!(peaks.n_peaks(), 0);
    assert_vec_close(
        peaks.trend.values().column(0),
        &(1..=14).map(|i| 2.0 * i as f64).collect::<Vec<_>>(),
        1e-9,
        "trend",
    );
}

#[test]
fn test_alternating_uniformity_uses_edge_bins() {
    let frame = alternating(20);
    let range = FeatureRange::default();
    let du = distribution_uniformity(&frame, 7, range, 1, 1).unwrap();
    // 7 values split 3/4 or 4/3 over 7 bins
    let p: f64 = 3.0 / 7.0;
    let q: f64 = 4.0 / 7.0;
    let expected = -(p * p.ln() + q * q.ln()) / 7f64.ln();
    assert_vec_close(du.values().column(0), &[expected; 14], 1e-12, "du");
}

// ─── Sparse series ──────────────────────────────────────────────────────────

#[test]
fn test_series_at_threshold_is_excluded() {
    let frame = with_gap();
    let report = analyze(&frame, &AnalysisConfig::default()).unwrap();

    assert_eq!(report.cleaned.columns(), &["A", "B"]);
    assert_eq!(report.resonance.columns(), &["A", "B"]);
    assert_eq!(report.resonance.nrows(), 9);
    assert!(!report.resonance.values().has_missing());
    for v in report.fluctuation.values().as_slice() {
        assert!((0.0..=1.0).contains(v));
    }
}

#[test]
fn test_lower_threshold_keeps_gap_as_missing_windows() {
    let frame = with_gap();
    let config = AnalysisConfig::new(3).with_min_valid_rows(9);
    let report = analyze(&frame, &config).unwrap();

    let c = report.fluctuation.column("C").unwrap();
    assert_eq!(c.len(), 13);
    // windows ending at rows 5..=11 touch the gap
    for (w, v) in c.iter().enumerate() {
        let end = w + 2;
        assert_eq!(is_missing(*v), (5..=11).contains(&end), "window ending {}", end);
    }
    // missing cells do not break the cumulative trend
    let trend = report.peaks.trend.values().column(0);
    assert!(trend.windows(2).all(|w| w[1] >= w[0]));
}

#[test]
fn test_every_series_sparse() {
    let frame = with_gap().select_columns(&[2]);
    assert!(matches!(
        analyze(&frame, &AnalysisConfig::default()),
        Err(NltsaError::InsufficientColumns {
            total: 1,
            min_valid_rows: 10
        })
    ));
}

// ─── Decomposition trajectories ─────────────────────────────────────────────

#[test]
fn test_trajectory_rows_and_repeatability() {
    let frame = scale_columns(&mobility_table(40), None).unwrap();
    let opts = SummarizerOptions::default();
    for method in DecompositionMethod::all(2, 42) {
        let a = summarize_windows(&frame, 10, &method, &opts)
            .unwrap_or_else(|e| panic!("{}: {}", method, e));
        let b = summarize_windows(&frame, 10, &method, &opts).unwrap();
        assert_eq!(a.nrows(), 31, "{}", method);
        let finite = a.values().as_slice().iter().filter(|v| v.is_finite()).count();
        assert_eq!(finite, 31, "{}: every window summarized", method);
        assert_eq!(bits(&a), bits(&b), "{}", method);
    }
}

#[test]
fn test_compare_methods_long_form() {
    let frame = scale_columns(&mobility_table(30), None).unwrap();
    let methods = vec![DecompositionMethod::pca(2), DecompositionMethod::factor_analysis(1)];
    let opts = SummarizerOptions::default().with_failure_policy(WindowFailurePolicy::Skip);
    let trajectory = compare_methods(&frame, 7, &methods, &opts).unwrap();

    assert_eq!(trajectory.len(), 24);
    let long = trajectory.to_long();
    assert_eq!(long.len(), 48);
    let json = serde_json::to_value(&long[0]).unwrap();
    assert_eq!(json["method"], "pca");
    assert_eq!(json["label"], "2020-03-07");
}

#[test]
fn test_oversized_input_rejected_up_front() {
    let frame = mobility_table(50);
    let opts = SummarizerOptions::default().with_max_rows(49);
    assert_eq!(
        summarize_windows(&frame, 5, &DecompositionMethod::pca(1), &opts),
        Err(NltsaError::TooLarge {
            rows: 50,
            max_rows: 49
        })
    );
}

// ─── Configuration ──────────────────────────────────────────────────────────

#[test]
fn test_pipeline_from_config_file() {
    let config = AnalysisConfig::from_json_file(fixture("helsinki_config.json")).unwrap();
    assert_eq!(config.methods.len(), 3);

    let report = analyze(&mobility_table(45), &config).unwrap();
    assert_eq!(report.cleaned.ncols(), 3);
    assert!(report
        .cleaned
        .columns()
        .iter()
        .all(|c| c.starts_with("Finland-Helsinki-")));

    let trajectory = report.trajectory.unwrap();
    assert_eq!(trajectory.methods(), &["pca", "ica", "kernel_pca"]);
    assert_eq!(trajectory.index(), report.resonance.index());
    for method in trajectory.methods() {
        let values = trajectory.values(method).unwrap();
        assert!(values.iter().all(|v| v.is_finite()), "{}", method);
    }
    // the step-wise complexity matches the resonance row sums
    let resonance = report.resonance.values();
    for (i, step) in report.peaks.step.iter().enumerate() {
        let sum: f64 = (0..resonance.ncols()).map(|j| resonance[(i, j)]).sum();
        assert!((sum - step).abs() < 1e-12);
    }
}
