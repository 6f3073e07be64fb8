// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Harness configuration (TOML file, environment, CLI overrides)
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests below
//!
//! Precedence: CLI override > config file > environment > built-in default.
//!
//! ```toml
//! java = "/opt/jdk/bin/java"
//! classpath = "build/classes"
//! workload = "GarbageProducer"
//! timeout_secs = 300
//! stage_workload = true
//! inherited_options = ["-Xint"]
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{HarnessError, Result};
use crate::invocation::FlagCombination;
use crate::options;
use crate::runner::DEFAULT_TIMEOUT;
use crate::workload::WORKLOAD_CLASS;

/// Runtime home variables, in lookup order.
pub const RUNTIME_HOME_VARS: [&str; 2] = ["TEST_JDK", "JAVA_HOME"];

/// On-disk configuration; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub java: Option<PathBuf>,
    pub classpath: Option<String>,
    pub workload: Option<String>,
    pub timeout_secs: Option<u64>,
    pub stage_workload: Option<bool>,
    /// Replaces the options inherited through the environment.
    pub inherited_options: Option<Vec<String>>,
}

impl HarnessConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .map_err(|source| HarnessError::ConfigRead { path: path.to_path_buf(), source })?;
        Self::parse(&data, path)
    }

    pub fn parse(data: &str, origin: &Path) -> Result<Self> {
        toml::from_str(data)
            .map_err(|source| HarnessError::ConfigParse { path: origin.to_path_buf(), source })
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub java: Option<PathBuf>,
    pub classpath: Option<String>,
    pub workload: Option<String>,
    pub timeout_secs: Option<u64>,
    pub no_stage: bool,
    /// Combination selectors such as `on,off`.
    pub only: Vec<String>,
}

/// Fully resolved settings for one harness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub java: PathBuf,
    pub classpath: Option<String>,
    pub workload: String,
    pub timeout: Duration,
    /// Compile the embedded workload because no classpath was given.
    pub stage_workload: bool,
    /// Inherited options before filtering.
    pub inherited_options: Vec<String>,
    /// Combinations to run; empty means the full matrix.
    pub selection: Vec<FlagCombination>,
}

impl Settings {
    /// Resolves against the process environment.
    pub fn resolve(file: HarnessConfig, overrides: Overrides) -> Result<Self> {
        Self::resolve_with(file, overrides, |name| env::var(name).ok())
    }

    pub fn resolve_with<F>(file: HarnessConfig, overrides: Overrides, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let java = overrides
            .java
            .or(file.java)
            .unwrap_or_else(|| runtime_from_env(&lookup));
        let classpath = overrides.classpath.or(file.classpath);
        let workload = overrides
            .workload
            .or(file.workload)
            .unwrap_or_else(|| WORKLOAD_CLASS.to_string());
        let timeout = match overrides.timeout_secs.or(file.timeout_secs) {
            Some(0) => {
                return Err(HarnessError::InvalidSetting {
                    key: "timeout_secs",
                    reason: "must be at least 1".to_string(),
                })
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };
        let stage_workload =
            !overrides.no_stage && file.stage_workload.unwrap_or(true) && classpath.is_none();
        // Staging only ever provides the embedded class.
        if stage_workload && workload != WORKLOAD_CLASS {
            return Err(HarnessError::InvalidSetting {
                key: "workload",
                reason: format!(
                    "`{workload}` needs a classpath; only {WORKLOAD_CLASS} is staged (or pass --no-stage)"
                ),
            });
        }
        let inherited_options = file
            .inherited_options
            .unwrap_or_else(|| options::inherited_options_with(&lookup));
        let selection = overrides
            .only
            .iter()
            .map(|selector| parse_selector(selector))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { java, classpath, workload, timeout, stage_workload, inherited_options, selection })
    }
}

fn runtime_from_env<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let java = format!("java{}", env::consts::EXE_SUFFIX);
    RUNTIME_HOME_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .find(|home| !home.trim().is_empty())
        .map(|home| Path::new(home.trim()).join("bin").join(&java))
        .unwrap_or_else(|| PathBuf::from(java))
}

/// Parses `<before>,<after>` where each side is `on`/`off` (also `+`/`-`, `true`/`false`).
pub fn parse_selector(selector: &str) -> Result<FlagCombination> {
    let invalid = || HarnessError::Selector(selector.to_string());
    let (before, after) = selector.split_once(',').ok_or_else(invalid)?;
    let switch = |value: &str| match value.trim().to_ascii_lowercase().as_str() {
        "on" | "+" | "true" => Some(true),
        "off" | "-" | "false" => Some(false),
        _ => None,
    };
    match (switch(before), switch(after)) {
        (Some(before), Some(after)) => Ok(FlagCombination::new(before, after)),
        _ => Err(invalid()),
    }
}
