// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Matrix driver over the four verify-switch combinations
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: `tests/matrix.rs` (stub runtime, all outcome kinds)
//!
//! Combinations run sequentially in [`MATRIX`] order. A harness error in one
//! combination is recorded and the driver moves on, so a single run reports
//! as much as it can.

use std::time::Duration;

use serde::Serialize;

use crate::analyzer::{self, AssertionFailure};
use crate::invocation::{build_arguments, FlagCombination, Launcher};
use crate::runner;

/// Fixed execution order.
pub const MATRIX: [FlagCombination; 4] = [
    FlagCombination::new(false, false),
    FlagCombination::new(true, true),
    FlagCombination::new(true, false),
    FlagCombination::new(false, true),
];

/// Everything the driver needs for one pass over the matrix.
#[derive(Debug, Clone)]
pub struct MatrixPlan {
    pub launcher: Launcher,
    /// Already-filtered inherited options.
    pub baseline: Vec<String>,
    pub workload: String,
    pub timeout: Duration,
    /// Subset of [`MATRIX`] to run; empty runs all of it.
    pub selection: Vec<FlagCombination>,
}

impl MatrixPlan {
    /// Combinations to run, in [`MATRIX`] order.
    pub fn combinations(&self) -> Vec<FlagCombination> {
        MATRIX
            .into_iter()
            .filter(|combination| {
                self.selection.is_empty() || self.selection.contains(combination)
            })
            .collect()
    }
}

/// Verdict for one combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "details", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed(Vec<AssertionFailure>),
    /// The harness could not obtain a result (spawn failure, timeout, i/o).
    Infrastructure(String),
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombinationReport {
    pub combination: FlagCombination,
    pub command_line: String,
    pub exit_code: Option<i32>,
    pub elapsed_ms: u64,
    pub outcome: Outcome,
}

/// Aggregated outcomes of one matrix pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatrixReport {
    pub combinations: Vec<CombinationReport>,
}

impl MatrixReport {
    pub fn passed(&self) -> bool {
        self.combinations.iter().all(|report| report.outcome.is_pass())
    }

    pub fn assertion_failures(&self) -> usize {
        self.combinations
            .iter()
            .map(|report| match &report.outcome {
                Outcome::Failed(failures) => failures.len(),
                _ => 0,
            })
            .sum()
    }

    pub fn infrastructure_errors(&self) -> usize {
        self.combinations
            .iter()
            .filter(|report| matches!(report.outcome, Outcome::Infrastructure(_)))
            .count()
    }
}

/// Runs build → launch → analyze for every planned combination.
pub fn run_matrix(plan: &MatrixPlan) -> MatrixReport {
    let mut report = MatrixReport::default();
    for combination in plan.combinations() {
        report.combinations.push(run_combination(plan, combination));
    }
    report
}

/// Runs a single combination; never fails, harness errors become [`Outcome::Infrastructure`].
pub fn run_combination(plan: &MatrixPlan, combination: FlagCombination) -> CombinationReport {
    let arguments = build_arguments(combination, &plan.baseline, &plan.workload);
    let command_line = plan.launcher.render(&arguments);
    log::info!("running {combination}");
    log::debug!("command: {command_line}");

    match runner::run(&plan.launcher, &arguments, plan.timeout) {
        Ok(captured) => {
            let failures = analyzer::analyze(combination, &captured);
            let outcome = if failures.is_empty() {
                log::info!("{combination}: passed in {:?}", captured.elapsed);
                Outcome::Passed
            } else {
                for failure in &failures {
                    log::warn!("{combination}: {failure}\n{}", failure.excerpt);
                }
                log::debug!("{combination}: full output:\n{}", captured.text);
                Outcome::Failed(failures)
            };
            CombinationReport {
                combination,
                command_line,
                exit_code: Some(captured.exit_code),
                elapsed_ms: elapsed_ms(captured.elapsed),
                outcome,
            }
        }
        Err(err) => {
            log::error!("{combination}: {err}");
            CombinationReport {
                combination,
                command_line,
                exit_code: None,
                elapsed_ms: 0,
                outcome: Outcome::Infrastructure(err.to_string()),
            }
        }
    }
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(selection: Vec<FlagCombination>) -> MatrixPlan {
        MatrixPlan {
            launcher: Launcher::new("/nonexistent/verify-gc-flags/java"),
            baseline: Vec::new(),
            workload: "GarbageProducer".to_string(),
            timeout: Duration::from_secs(1),
            selection,
        }
    }

    #[test]
    fn matrix_order_is_fixed() {
        let order: Vec<_> = plan(Vec::new())
            .combinations()
            .into_iter()
            .map(|c| (c.verify_before, c.verify_after))
            .collect();
        assert_eq!(order, vec![(false, false), (true, true), (true, false), (false, true)]);
    }

    #[test]
    fn selection_keeps_matrix_order() {
        let selected = plan(vec![FlagCombination::new(false, true), FlagCombination::new(false, false)])
            .combinations();
        assert_eq!(selected, vec![FlagCombination::new(false, false), FlagCombination::new(false, true)]);
    }

    #[test]
    fn spawn_failure_is_recorded_for_every_combination() {
        let report = run_matrix(&plan(Vec::new()));
        assert_eq!(report.combinations.len(), 4);
        assert_eq!(report.infrastructure_errors(), 4);
        assert_eq!(report.assertion_failures(), 0);
        assert!(!report.passed());
        assert!(report.combinations[0].command_line.contains("-XX:-VerifyBeforeGC -XX:-VerifyAfterGC"));
    }

    #[test]
    fn elapsed_saturates_instead_of_wrapping() {
        assert_eq!(elapsed_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(elapsed_ms(Duration::MAX), u64::MAX);
    }

    #[test]
    fn empty_report_passes() {
        assert!(MatrixReport::default().passed());
    }
}
