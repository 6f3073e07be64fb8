// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! CONTEXT: GC self-verification marker harness (VerifyBeforeGC / VerifyAfterGC)
//!
//! OWNERS: @runtime
//!
//! STATUS: Functional
//!
//! API_STABILITY: Unstable
//!
//! TEST_COVERAGE:
//!   - Unit tests: per module (`options`, `invocation`, `runner`, `markers`, `analyzer`, `config`, `report`)
//!   - Integration: `tests/matrix.rs` (stub runtime), `tests/cli.rs` (binary exit codes)
//!
//! PUBLIC API:
//!   - `options`: inherited option discovery and filtering
//!   - `invocation`: `FlagCombination`, `ArgumentList`, `Launcher`
//!   - `runner::run()`: bounded child execution with merged output
//!   - `markers` / `analyzer`: marker grammar and per-run assertions
//!   - `matrix::run_matrix()`: the four-combination driver
//!   - `config`, `workload`, `report`: settings, workload staging, output
//!
//! DEPENDENCIES:
//!   - regex + once_cell: marker grammar compiled once
//!   - parking_lot: merged stdout/stderr buffer
//!   - serde/toml/serde_json: configuration and JSON report
//!   - thiserror + log: error taxonomy and diagnostics

pub mod analyzer;
pub mod config;
pub mod error;
pub mod invocation;
pub mod markers;
pub mod matrix;
pub mod options;
pub mod report;
pub mod runner;
pub mod workload;

pub use analyzer::{analyze, AssertionFailure, Violation};
pub use config::{HarnessConfig, Overrides, Settings};
pub use error::{HarnessError, Result};
pub use invocation::{build_arguments, ArgumentList, FlagCombination, Launcher};
pub use markers::{MarkerFamily, MarkerSpec};
pub use matrix::{run_matrix, MatrixPlan, MatrixReport, Outcome, MATRIX};
pub use runner::CapturedResult;

use workload::StagedWorkload;

/// A ready-to-run plan plus the scratch workload it may depend on.
///
/// Keep this alive for the whole run: dropping it removes the staged classes.
#[derive(Debug)]
pub struct PreparedRun {
    pub plan: MatrixPlan,
    _staged: Option<StagedWorkload>,
}

/// Turns resolved settings into a plan, compiling the embedded workload if needed.
pub fn prepare(settings: &Settings) -> Result<PreparedRun> {
    let baseline = options::baseline_options(&settings.inherited_options);
    let mut launcher = Launcher::new(&settings.java);
    let mut staged = None;

    if let Some(classpath) = &settings.classpath {
        launcher = launcher.with_classpath(classpath);
    } else if settings.stage_workload {
        let workload = workload::stage(&workload::javac_for(&settings.java), settings.timeout)?;
        launcher = launcher.with_classpath(workload.classpath());
        staged = Some(workload);
    }

    let plan = MatrixPlan {
        launcher,
        baseline,
        workload: settings.workload.clone(),
        timeout: settings.timeout,
        selection: settings.selection.clone(),
    };
    Ok(PreparedRun { plan, _staged: staged })
}
