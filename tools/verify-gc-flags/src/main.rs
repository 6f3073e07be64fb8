// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
#![forbid(unsafe_code)]

//! CONTEXT: verify-gc-flags entrypoint wiring CLI, config and logging to the matrix driver
//!
//! OWNERS: @runtime
//!
//! STATUS: Functional
//!
//! API_STABILITY: Unstable
//!
//! TEST_COVERAGE: `tools/verify-gc-flags/tests/cli.rs`
//!
//! PUBLIC API:
//!   - CLI: verify-gc-flags [--config <toml>] [--java <path>] [--classpath <cp>]
//!          [--workload <class>] [--timeout-secs <n>] [--only <on|off>,<on|off>]...
//!          [--no-stage] [--report <json>]
//!   - Exit: 0 all passed, 1 assertion failure(s), 2 harness error(s)

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use verify_gc_flags::config::{HarnessConfig, Overrides, Settings};
use verify_gc_flags::{matrix, prepare, report};

/// Runs the runtime under every VerifyBeforeGC/VerifyAfterGC combination and checks its markers.
#[derive(Debug, Parser)]
#[command(name = "verify-gc-flags", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Runtime launcher (default: $TEST_JDK/bin/java, $JAVA_HOME/bin/java, then `java`).
    #[arg(long, value_name = "PATH")]
    java: Option<PathBuf>,
    /// Classpath containing the workload; disables staging of the embedded workload.
    #[arg(long, value_name = "CLASSPATH")]
    classpath: Option<String>,
    /// Workload entry point.
    #[arg(long, value_name = "CLASS")]
    workload: Option<String>,
    /// Upper bound on each child's lifetime.
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,
    /// Only run the given combination(s), e.g. `on,off`.
    #[arg(long, value_name = "BEFORE,AFTER")]
    only: Vec<String>,
    /// Do not compile the embedded workload.
    #[arg(long)]
    no_stage: bool,
    /// Write a JSON report of every outcome.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match run(Cli::parse()) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("verify-gc-flags: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let file = match &cli.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };
    let overrides = Overrides {
        java: cli.java,
        classpath: cli.classpath,
        workload: cli.workload,
        timeout_secs: cli.timeout_secs,
        no_stage: cli.no_stage,
        only: cli.only,
    };
    let settings = Settings::resolve(file, overrides).context("resolve settings")?;
    log::debug!("settings: {settings:?}");

    let prepared = prepare(&settings).context("prepare workload")?;
    let outcome = matrix::run_matrix(&prepared.plan);

    print!("{}", report::render_summary(&outcome));
    if let Some(path) = &cli.report {
        report::write_json(&outcome, path)?;
        log::info!("report written to {}", path.display());
    }

    let code = report::exit_code(&outcome);
    Ok(u8::try_from(code).unwrap_or(2))
}
