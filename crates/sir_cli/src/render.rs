//! Console rendering of run reports.

use sir_core::simulation::{Comparison, Report};
use std::fmt::{self, Write};

const RULE: &str = "-----------------------------------";

/// `(t, i(t), s(t))` table for one run, six decimals.
pub fn checkpoint_table(report: &Report) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "===== h = {} =====", report.step_size)?;
    writeln!(
        out,
        "λ = {:.2}, μ = {:.2}",
        report.params.transmission_rate(),
        report.params.removal_rate()
    )?;
    writeln!(out, "{RULE}")?;
    writeln!(out, " t       i(t)         s(t)")?;
    writeln!(out, "{RULE}")?;
    for row in &report.rows {
        writeln!(
            out,
            "{:<5}    {:<10.6}   {:.6}",
            row.t, row.infected, row.susceptible
        )?;
    }
    writeln!(out, "{RULE}")?;
    Ok(out)
}

/// Peak, first-integral drift, and checkpoint deviations across runs.
pub fn comparison_table(
    reports: &[Report],
    comparisons: &[Comparison],
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "===== step size comparison =====")?;
    writeln!(out, "{:<8} {:<10} {:<8} {}", "h", "peak i", "at t", "drift")?;
    for report in reports {
        writeln!(
            out,
            "{:<8} {:<10.6} {:<8} {:.3e}{}",
            report.step_size,
            report.peak_infected.value,
            report.peak_infected.time,
            report.invariant_drift,
            if report.left_unit_interval {
                "  (left [0, 1])"
            } else {
                ""
            }
        )?;
    }
    for comparison in comparisons {
        writeln!(
            out,
            "h = {} vs h = {}: max |Δi| = {:.6}, max |Δs| = {:.6}",
            comparison.step_size,
            comparison.reference_step_size,
            comparison.max_infected_deviation,
            comparison.max_susceptible_deviation
        )?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{checkpoint_table, comparison_table};
    use sir_core::{compare, run_all, SimulationConfig};

    #[test]
    fn checkpoint_table_lists_each_checkpoint() {
        let reports = run_all(&SimulationConfig::default()).expect("default runs");
        let table = checkpoint_table(&reports[0]).expect("format");
        assert!(table.starts_with("===== h = 1 ====="));
        assert!(table.contains("λ = 0.80, μ = 0.20"));
        assert!(table.contains("10       0.412168     0.336104"));
        assert_eq!(table.lines().count(), 5 + 5 + 1);
    }

    #[test]
    fn comparison_table_has_row_per_run() {
        let config = SimulationConfig::default();
        let reports = run_all(&config).expect("default runs");
        let comparison = compare(&reports[0], &reports[1], &config.checkpoints).expect("compare");
        let table = comparison_table(&reports, &[comparison]).expect("format");
        assert!(table.contains("h = 0.1 vs h = 1"));
        assert_eq!(table.lines().count(), 2 + reports.len() + 1);
    }

    #[test]
    fn comparison_table_flags_overshooting_run() {
        let config = SimulationConfig {
            step_sizes: vec![5.0],
            ..SimulationConfig::default()
        };
        let reports = run_all(&config).expect("overshoot is not an error");
        let table = comparison_table(&reports, &[]).expect("format");
        let row = table.lines().nth(2).expect("run row");
        assert!(row.starts_with("5 "));
        assert!(row.contains("NaN"), "row: {row}");
        assert!(row.ends_with("(left [0, 1])"), "row: {row}");
    }
}
