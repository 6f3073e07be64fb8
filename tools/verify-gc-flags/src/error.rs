// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Harness-environment error taxonomy
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//!
//! Assertion failures are not errors: they live in [`crate::analyzer`] and
//! never abort a run. Everything here means the harness itself could not do
//! its job (missing runtime, hung child, unreadable configuration).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result alias used across the harness.
pub type Result<T> = core::result::Result<T, HarnessError>;

/// Errors raised by the harness environment rather than by the runtime under test.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The child process could not be started at all.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The child outlived its deadline and was killed.
    #[error("{program} did not exit within {timeout:?} and was killed")]
    Timeout { program: String, timeout: Duration },
    /// Waiting on the child or draining its pipes failed.
    #[error("i/o error while running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// Configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Configuration file is not valid TOML for [`crate::config::HarnessConfig`].
    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// A resolved setting is unusable, whatever its source.
    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
    /// A combination selector such as `on,off` could not be parsed.
    #[error("invalid combination selector {0:?} (expected <on|off>,<on|off>)")]
    Selector(String),
    /// The embedded workload could not be compiled.
    #[error("workload staging failed: {0}")]
    Staging(String),
    /// The JSON report could not be written.
    #[error("failed to write report {path}: {reason}")]
    Report { path: PathBuf, reason: String },
}
