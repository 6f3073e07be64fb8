// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Human-readable summary and JSON export of a matrix report
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests below

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{HarnessError, Result};
use crate::matrix::{MatrixReport, Outcome};

/// Process exit code for a finished report.
pub fn exit_code(report: &MatrixReport) -> i32 {
    if report.assertion_failures() > 0 {
        1
    } else if report.infrastructure_errors() > 0 {
        2
    } else {
        0
    }
}

/// One line per combination, followed by every failure and its excerpt.
pub fn render_summary(report: &MatrixReport) -> String {
    let mut out = String::new();
    for entry in &report.combinations {
        let verdict = match &entry.outcome {
            Outcome::Passed => "PASS".to_string(),
            Outcome::Failed(failures) => format!("FAIL ({} assertion(s))", failures.len()),
            Outcome::Infrastructure(_) => "ERROR".to_string(),
        };
        let _ = writeln!(out, "{verdict:<24} {}", entry.combination);
        match &entry.outcome {
            Outcome::Passed => {}
            Outcome::Failed(failures) => {
                let _ = writeln!(out, "    command: {}", entry.command_line);
                for failure in failures {
                    let _ = writeln!(out, "    - {failure}");
                    for line in failure.excerpt.lines() {
                        let _ = writeln!(out, "      | {line}");
                    }
                }
            }
            Outcome::Infrastructure(reason) => {
                let _ = writeln!(out, "    command: {}", entry.command_line);
                let _ = writeln!(out, "    - {reason}");
            }
        }
    }
    let _ = writeln!(
        out,
        "{} combination(s), {} assertion failure(s), {} harness error(s)",
        report.combinations.len(),
        report.assertion_failures(),
        report.infrastructure_errors()
    );
    out
}

/// Writes `report` as pretty JSON.
pub fn write_json(report: &MatrixReport, path: &Path) -> Result<()> {
    let failed = |reason: String| HarnessError::Report { path: path.to_path_buf(), reason };
    let json = serde_json::to_string_pretty(report).map_err(|err| failed(err.to_string()))?;
    fs::write(path, json + "\n").map_err(|err| failed(err.to_string()))
}
