// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
#![forbid(unsafe_code)]

//! CONTEXT: Stand-in runtime for hermetic harness tests
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Driven by `tests/matrix.rs` and `tests/cli.rs`
//!
//! Accepts the launcher command line the harness produces and prints verify
//! markers for a few simulated collections, like a real runtime would. The
//! system property `-Dstub.mode=<mode>` selects a misbehaviour:
//!
//!   - `ok` (default): markers exactly per switch
//!   - `corrupt`: every enabled marker is truncated to its bare name
//!   - `swap`: each switch emits the other family's marker
//!   - `crash`: markers as `ok`, then exit 134
//!   - `hang`: never exits
//!
//! `-Dstub.echo=true` prints the received arguments, one per line, first.

use std::io::{self, Write};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

const COLLECTIONS: usize = 3;
const SUBSYSTEMS: &str = "threads heap tenured eden syms strs zone dict metaspace chunks hand C-heap code cache ";

#[derive(Debug, Default)]
struct StubArgs {
    unlocked: bool,
    verify_before: bool,
    verify_after: bool,
    mode: String,
    echo: bool,
    main_class: Option<String>,
}

fn parse(args: &[String]) -> Result<StubArgs, String> {
    let mut parsed = StubArgs { mode: "ok".to_string(), ..StubArgs::default() };
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if parsed.main_class.is_some() {
            // Arguments after the main class belong to the program.
            continue;
        }
        match arg.as_str() {
            "-cp" | "-classpath" => {
                iter.next().ok_or("-cp requires class path specification")?;
            }
            "-XX:+UnlockDiagnosticVMOptions" => parsed.unlocked = true,
            "-XX:-UnlockDiagnosticVMOptions" => parsed.unlocked = false,
            _ if arg.starts_with("-XX:") => {
                let option = &arg["-XX:".len()..];
                if option.contains('=') {
                    // Valued options such as `-XX:MaxRAM=1g` do not affect verification.
                    continue;
                }
                let (enabled, name) = if let Some(name) = option.strip_prefix('+') {
                    (true, name)
                } else if let Some(name) = option.strip_prefix('-') {
                    (false, name)
                } else {
                    return Err(format!("Unrecognized VM option '{option}'"));
                };
                if matches!(name, "VerifyBeforeGC" | "VerifyAfterGC") && !parsed.unlocked {
                    return Err(format!(
                        "VM option '{name}' is diagnostic and must be enabled via -XX:+UnlockDiagnosticVMOptions."
                    ));
                }
                match name {
                    "VerifyBeforeGC" => parsed.verify_before = enabled,
                    "VerifyAfterGC" => parsed.verify_after = enabled,
                    _ => {}
                }
            }
            _ if arg.starts_with("-Dstub.mode=") => {
                parsed.mode = arg["-Dstub.mode=".len()..].to_string();
            }
            "-Dstub.echo=true" => parsed.echo = true,
            _ if arg.starts_with('-') => {}
            _ => parsed.main_class = Some(arg.clone()),
        }
    }
    if parsed.main_class.is_none() {
        return Err("no main class specified".to_string());
    }
    Ok(parsed)
}

fn marker(name: &str, corrupt: bool) -> String {
    if corrupt {
        format!("{name}:")
    } else {
        format!("{name}:[Verifying {SUBSYSTEMS}]")
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let parsed = match parse(&args) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("Error: {message}");
            eprintln!("Error: Could not create the Java Virtual Machine.");
            return ExitCode::from(1);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if parsed.echo {
        for arg in &args {
            let _ = writeln!(out, "{arg}");
        }
    }

    if parsed.mode == "hang" {
        loop {
            thread::sleep(Duration::from_secs(60));
        }
    }

    let corrupt = parsed.mode == "corrupt";
    let (before, after) = if parsed.mode == "swap" {
        (parsed.verify_after, parsed.verify_before)
    } else {
        (parsed.verify_before, parsed.verify_after)
    };
    for cycle in 0..COLLECTIONS {
        if before {
            let _ = writeln!(out, "{}", marker("VerifyBeforeGC", corrupt));
        }
        let _ = out.flush();
        eprintln!("[gc] GC({cycle}) Pause Young (Allocation Failure) 3M->1M(5M)");
        if after {
            let _ = writeln!(out, "{}", marker("VerifyAfterGC", corrupt));
        }
    }
    let _ = out.flush();

    if parsed.mode == "crash" {
        return ExitCode::from(134);
    }
    ExitCode::SUCCESS
}
