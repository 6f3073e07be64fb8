// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Assertions over one captured run
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests below
//!
//! Checks, in order: exit code is 0; no corrupted marker of either family;
//! per family, well-formed markers present iff the family's switch is on.
//! Every violation is collected; nothing short-circuits.

use std::fmt;

use serde::Serialize;

use crate::invocation::FlagCombination;
use crate::markers::MarkerFamily;
use crate::runner::CapturedResult;

/// Exit code the workload must finish with.
pub const EXPECTED_EXIT_CODE: i32 = 0;

const MAX_EXCERPT_LINES: usize = 5;
const MAX_LINE_BYTES: usize = 240;
const HEAD_TAIL_BYTES: usize = 1024;

/// Which predicate failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    ExitCode { expected: i32, actual: i32, signal: Option<i32> },
    CorruptedMarker { family: MarkerFamily, occurrences: usize },
    MissingMarker { family: MarkerFamily },
    UnexpectedMarker { family: MarkerFamily, occurrences: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExitCode { expected, actual, signal: Some(signal) } => {
                write!(f, "expected exit code {expected}, got {actual} (signal {signal})")
            }
            Self::ExitCode { expected, actual, signal: None } => {
                write!(f, "expected exit code {expected}, got {actual}")
            }
            Self::CorruptedMarker { family, occurrences } => {
                write!(f, "{occurrences} corrupted {family} marker(s) in output")
            }
            Self::MissingMarker { family } => {
                write!(f, "{family} enabled but no well-formed {family} marker in output")
            }
            Self::UnexpectedMarker { family, occurrences } => {
                write!(f, "{family} disabled but {occurrences} well-formed {family} marker(s) in output")
            }
        }
    }
}

/// One violated predicate plus the evidence for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionFailure {
    #[serde(flatten)]
    pub violation: Violation,
    /// Pattern the predicate evaluated, empty for the exit-code check.
    pub pattern: String,
    /// Bounded slice of the captured text supporting the verdict.
    pub excerpt: String,
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.violation)?;
        if !self.pattern.is_empty() {
            write!(f, " [pattern: {}]", self.pattern)?;
        }
        Ok(())
    }
}

/// Evaluates every predicate for `combination` against `captured`.
pub fn analyze(combination: FlagCombination, captured: &CapturedResult) -> Vec<AssertionFailure> {
    let text = captured.text.as_str();
    let mut failures = Vec::new();

    if captured.exit_code != EXPECTED_EXIT_CODE {
        failures.push(AssertionFailure {
            violation: Violation::ExitCode {
                expected: EXPECTED_EXIT_CODE,
                actual: captured.exit_code,
                signal: captured.signal,
            },
            pattern: String::new(),
            excerpt: head_and_tail(text),
        });
    }

    for family in MarkerFamily::ALL {
        let spec = family.spec();
        let corrupted = spec.corrupted_matches(text);
        if !corrupted.is_empty() {
            failures.push(AssertionFailure {
                violation: Violation::CorruptedMarker { family, occurrences: corrupted.len() },
                pattern: spec.corrupted_pattern(),
                excerpt: lines_at(text, &corrupted),
            });
        }
    }

    for family in MarkerFamily::ALL {
        let spec = family.spec();
        let matches = spec.well_formed_matches(text);
        let violation = match (family.enabled_in(combination), matches.is_empty()) {
            (true, true) => Violation::MissingMarker { family },
            (false, false) => Violation::UnexpectedMarker { family, occurrences: matches.len() },
            _ => continue,
        };
        let excerpt =
            if matches.is_empty() { head_and_tail(text) } else { lines_at(text, &matches) };
        failures.push(AssertionFailure {
            violation,
            pattern: spec.well_formed_pattern().to_string(),
            excerpt,
        });
    }

    failures
}

/// Lines enclosing the first few `positions`, each clipped.
fn lines_at(text: &str, positions: &[usize]) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut covered = 0;
    for &pos in positions {
        if lines.len() == MAX_EXCERPT_LINES {
            break;
        }
        covered += 1;
        let start = text[..pos].rfind('\n').map_or(0, |nl| nl + 1);
        let end = text[pos..].find('\n').map_or(text.len(), |nl| pos + nl);
        let line = clip(&text[start..end], MAX_LINE_BYTES);
        if lines.last() != Some(&line) {
            lines.push(line);
        }
    }
    let mut excerpt = lines.join("\n");
    if covered < positions.len() {
        excerpt.push_str(&format!("\n... ({} occurrence(s) total)", positions.len()));
    }
    excerpt
}

/// Whole text when short, otherwise its first and last `HEAD_TAIL_BYTES`.
fn head_and_tail(text: &str) -> String {
    if text.len() <= 2 * HEAD_TAIL_BYTES {
        return text.to_string();
    }
    let head = clip(text, HEAD_TAIL_BYTES);
    let mut tail_start = text.len() - HEAD_TAIL_BYTES;
    while !text.is_char_boundary(tail_start) {
        tail_start += 1;
    }
    format!(
        "{head}\n... ({} bytes omitted) ...\n{}",
        tail_start - head.len(),
        &text[tail_start..]
    )
}

fn clip(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
