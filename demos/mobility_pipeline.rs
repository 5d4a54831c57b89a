//! Demo: complexity analysis of a city's mobility series
//!
//! Builds a synthetic Apple-mobility-style table (driving, walking and transit
//! requests for two cities, with a lockdown drop), then:
//! - keeps the Helsinki series and drops sparse ones,
//! - computes fluctuation intensity, distribution uniformity and resonance,
//! - reports the cumulative complexity and its significant peaks,
//! - compares per-window decomposition trajectories across methods.
//!
//! Run: RUST_LOG=info cargo run --example mobility_pipeline

use nltsa_core::decomposition::pca::explained_variance_ratio;
use nltsa_core::{
    analyze, column_key, AnalysisConfig, DecompositionMethod, TimeFrame, WindowFailurePolicy,
};
use std::f64::consts::PI;

fn synthetic_table(n: usize) -> TimeFrame {
    let keys = [
        ("Finland", "Helsinki", "driving", 1.0),
        ("Finland", "Helsinki", "walking", 0.8),
        ("Finland", "Helsinki", "transit", 0.6),
        ("Sweden", "Stockholm", "driving", 1.1),
    ];
    let index: Vec<String> = (0..n)
        .map(|i| format!("2020-{:02}-{:02}", 1 + i / 28, 1 + i % 28))
        .collect();
    let series = keys
        .iter()
        .enumerate()
        .map(|(j, &(country, region, mode, scale))| {
            let values = (0..n)
                .map(|i| {
                    // transit reporting starts late
                    if mode == "transit" && i < n / 4 {
                        return None;
                    }
                    let t = i as f64;
                    let lockdown = if i > n / 2 { 0.45 } else { 1.0 };
                    let weekly = (2.0 * PI * t / 7.0).sin();
                    let noise = 3.0 * (13.7 * (t + j as f64)).sin();
                    Some(scale * (100.0 * lockdown + 12.0 * weekly) + noise)
                })
                .collect();
            (column_key(&[country, region, mode]), values)
        })
        .collect();
    TimeFrame::from_series(index, series).unwrap()
}

fn main() {
    env_logger::init();

    let table = synthetic_table(112);
    println!("=== Input: {} ===", table);
    for key in table.columns() {
        println!("  {}", key);
    }

    let config = AnalysisConfig::new(7)
        .with_column_filter("Helsinki")
        .with_methods(DecompositionMethod::all(2, 42))
        .with_failure_policy(WindowFailurePolicy::Skip);

    let report = match analyze(&table, &config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("analysis failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("\n=== Cleaned: {} ===", report.cleaned);

    let complete = report.scaled.drop_incomplete_rows();
    if let Ok(ratios) = explained_variance_ratio(&complete.values().to_dmatrix(), 2) {
        println!(
            "  PCA explained variance over the whole period: {:?}",
            ratios
                .iter()
                .map(|r| format!("{:.1}%", r * 100.0))
                .collect::<Vec<_>>()
        );
    }

    println!("\n=== Complexity resonance (last 5 windows) ===");
    let n = report.resonance.nrows();
    for i in n.saturating_sub(5)..n {
        let row: Vec<String> = (0..report.resonance.ncols())
            .map(|j| format!("{:.3}", report.resonance.values()[(i, j)]))
            .collect();
        println!("  {}  {}", report.resonance.index()[i], row.join("  "));
    }

    println!("\n=== Cumulative complexity ===");
    let trend = report.peaks.trend.values().column(0);
    println!("  total: {:.3}", trend.last().copied().unwrap_or(0.0));
    match report.peaks.threshold {
        Some(t) => println!("  peak threshold (mean + 1 sd): {:.3}", t),
        None => println!("  no spread in step-wise complexity"),
    }
    for (label, value) in report
        .peaks
        .significant
        .index()
        .iter()
        .zip(report.peaks.significant.values().column(0))
    {
        println!("  peak at {}: {:.3}", label, value);
    }

    if let Some(trajectory) = &report.trajectory {
        println!("\n=== {} ===", trajectory);
        println!(
            "  {:>10} {}",
            "window",
            trajectory
                .methods()
                .iter()
                .map(|m| format!("{:>20}", m))
                .collect::<String>()
        );
        for i in (0..trajectory.len()).step_by(14) {
            let row: String = trajectory
                .methods()
                .iter()
                .filter_map(|m| trajectory.values(m))
                .map(|v| format!("{:>20.4}", v[i]))
                .collect();
            println!("  {:>10} {}", trajectory.index()[i], row);
        }
    }
}
