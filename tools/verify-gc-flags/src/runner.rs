// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Child process runner with merged output capture and a wall-clock bound
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests below (unix); matrix tests in `tests/`
//!
//! stdout and stderr are drained by two reader threads into one buffer, so
//! the captured text keeps the interleaving the OS delivered. Once the child
//! is reaped the readers get a short grace period to reach end-of-file. A
//! reader still blocked after that (a grandchild kept the pipe open) is
//! detached, so `timeout` stays an upper bound on `run`.

use std::io::{self, Read};
use std::process::{Child, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::{HarnessError, Result};
use crate::invocation::{ArgumentList, Launcher};

/// Default upper bound on one child's lifetime.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const READ_CHUNK: usize = 8 * 1024;
/// How long readers may keep draining after a normal exit.
const DRAIN_GRACE: Duration = Duration::from_secs(2);
/// How long readers may keep draining after the child was killed.
const KILLED_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Exit status and merged output of one finished child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedResult {
    /// Process exit code, or `128 + signal` when terminated by a signal.
    pub exit_code: i32,
    /// Terminating signal on unix, if any.
    pub signal: Option<i32>,
    /// stdout and stderr merged in delivery order.
    pub text: String,
    pub elapsed: Duration,
}

impl CapturedResult {
    pub fn new(exit_code: i32, text: impl Into<String>) -> Self {
        Self { exit_code, signal: None, text: text.into(), elapsed: Duration::ZERO }
    }
}

/// Launches `launcher` with `arguments` and waits at most `timeout` for it to exit.
pub fn run(
    launcher: &Launcher,
    arguments: &ArgumentList,
    timeout: Duration,
) -> Result<CapturedResult> {
    let program = launcher.display_name();
    let mut command = launcher.command(arguments);
    command.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

    let started = Instant::now();
    let mut child = command
        .spawn()
        .map_err(|source| HarnessError::Spawn { program: program.clone(), source })?;

    let merged = Arc::new(Mutex::new(Vec::new()));
    let (done_tx, done_rx) = mpsc::channel();
    let mut readers = 0;
    if let Some(stdout) = child.stdout.take() {
        spawn_drain(stdout, Arc::clone(&merged), done_tx.clone());
        readers += 1;
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_drain(stderr, Arc::clone(&merged), done_tx.clone());
        readers += 1;
    }
    drop(done_tx);

    let waited = wait_with_deadline(&mut child, timeout);
    let grace = if matches!(waited, Ok(Some(_))) { DRAIN_GRACE } else { KILLED_DRAIN_GRACE };
    let drained = await_drains(&done_rx, readers, grace, &program);
    let elapsed = started.elapsed();

    let status = match waited {
        Ok(Some(status)) => status,
        Ok(None) => return Err(HarnessError::Timeout { program, timeout }),
        Err(source) => return Err(HarnessError::Io { program, source }),
    };
    drained.map_err(|source| HarnessError::Io { program: program.clone(), source })?;

    let bytes = std::mem::take(&mut *merged.lock());
    let (exit_code, signal) = exit_code_of(status);
    log::debug!("{program} exited with {exit_code} after {elapsed:?} ({} bytes)", bytes.len());
    Ok(CapturedResult {
        exit_code,
        signal,
        text: String::from_utf8_lossy(&bytes).into_owned(),
        elapsed,
    })
}

fn spawn_drain<R>(mut source: R, sink: Arc<Mutex<Vec<u8>>>, done: Sender<io::Result<()>>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut chunk = [0u8; READ_CHUNK];
        let result = loop {
            match source.read(&mut chunk) {
                Ok(0) => break Ok(()),
                Ok(n) => sink.lock().extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => break Err(err),
            }
        };
        // The receiver is gone once `run` stopped waiting for this reader.
        let _ = done.send(result);
    });
}

/// Collects every reader's result, giving up on the stragglers after `grace`.
fn await_drains(
    done: &Receiver<io::Result<()>>,
    readers: usize,
    grace: Duration,
    program: &str,
) -> io::Result<()> {
    let deadline = Instant::now() + grace;
    let mut outcome = Ok(());
    for finished in 0..readers {
        let left = deadline.saturating_duration_since(Instant::now());
        match done.recv_timeout(left) {
            Ok(result) => outcome = outcome.and(result),
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "{program}: {} output reader(s) still blocked after exit; detaching",
                    readers - finished
                );
                break;
            }
            Err(RecvTimeoutError::Disconnected) => {
                outcome = outcome.and(Err(io::Error::other("output reader panicked")));
                break;
            }
        }
    }
    outcome
}

/// Returns `Ok(None)` when the deadline passed; the child is killed and reaped first.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now().checked_add(timeout);
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => {}
            Err(err) => {
                kill_and_reap(child);
                return Err(err);
            }
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            log::warn!("child {} exceeded {timeout:?}; killing", child.id());
            kill_and_reap(child);
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn kill_and_reap(child: &mut Child) {
    // kill fails only if the child already exited; reap either way.
    let _ = child.kill();
    if let Err(err) = child.wait() {
        log::warn!("failed to reap child {}: {err}", child.id());
    }
}

fn exit_code_of(status: ExitStatus) -> (i32, Option<i32>) {
    #[cfg(unix)]
    let signal = {
        use std::os::unix::process::ExitStatusExt as _;
        status.signal()
    };
    #[cfg(not(unix))]
    let signal: Option<i32> = None;

    match status.code() {
        Some(code) => (code, signal),
        None => (signal.map(|sig| 128 + sig).unwrap_or(1), signal),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::invocation::{build_arguments, FlagCombination};

    fn shell(script: &str) -> (Launcher, ArgumentList) {
        // `sh -c <script> <argv0> <args...>`: the harness arguments land in "$@".
        let launcher = Launcher::new("sh");
        let mut args = vec!["-c".to_string(), script.to_string(), "sh".to_string()];
        let harness = build_arguments(FlagCombination::new(false, false), &[], "W");
        args.extend(harness.as_slice().iter().cloned());
        (launcher, ArgumentList::new(args))
    }

    #[test]
    fn captures_both_streams_and_exit_code() {
        let (launcher, args) = shell("echo out; echo err 1>&2; exit 3");
        let result = run(&launcher, &args, Duration::from_secs(10)).unwrap();
        assert_eq!(result.exit_code, 3);
        assert!(result.text.contains("out\n"));
        assert!(result.text.contains("err\n"));
    }

    #[test]
    fn preserves_sequential_interleaving() {
        let (launcher, args) = shell("echo first; sleep 0.2; echo second 1>&2; sleep 0.2; echo third");
        let result = run(&launcher, &args, Duration::from_secs(10)).unwrap();
        let first = result.text.find("first").unwrap();
        let second = result.text.find("second").unwrap();
        let third = result.text.find("third").unwrap();
        assert!(first < second && second < third, "{:?}", result.text);
    }

    #[test]
    fn passes_arguments_verbatim() {
        let (launcher, args) = shell("printf '%s\\n' \"$@\"");
        let result = run(&launcher, &args, Duration::from_secs(10)).unwrap();
        assert_eq!(result.exit_code, 0);
        assert!(result.text.contains("-XX:-VerifyBeforeGC\n-XX:-VerifyAfterGC\nW\n"));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let launcher = Launcher::new("/nonexistent/verify-gc-flags/java");
        let args = build_arguments(FlagCombination::new(true, true), &[], "W");
        let err = run(&launcher, &args, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, HarnessError::Spawn { .. }), "{err}");
    }

    #[test]
    fn hung_child_times_out() {
        let (launcher, args) = shell("exec sleep 30");
        let started = Instant::now();
        let err = run(&launcher, &args, Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, HarnessError::Timeout { .. }), "{err}");
        assert!(started.elapsed() < Duration::from_secs(20));
    }

    #[test]
    fn timeout_bounds_run_even_if_a_grandchild_holds_the_pipes() {
        // `sleep` is forked, not exec'd, and keeps stdout open after `sh` is killed.
        let (launcher, args) = shell("sleep 6; echo done");
        let started = Instant::now();
        let err = run(&launcher, &args, Duration::from_millis(300)).unwrap_err();
        assert!(matches!(err, HarnessError::Timeout { .. }), "{err}");
        assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
    }

    #[test]
    fn lingering_grandchild_does_not_stall_a_finished_run() {
        let (launcher, args) = shell("sleep 6 & echo out; exit 0");
        let started = Instant::now();
        let result = run(&launcher, &args, Duration::from_secs(10)).unwrap();
        assert_eq!(result.exit_code, 0);
        assert!(result.text.contains("out\n"));
        assert!(started.elapsed() < Duration::from_secs(5), "{:?}", started.elapsed());
    }

    #[test]
    fn kill_and_reap_leaves_no_running_child() {
        let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let started = Instant::now();
        kill_and_reap(&mut child);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn signal_maps_to_shell_style_exit_code() {
        let (launcher, args) = shell("kill -9 $$");
        let result = run(&launcher, &args, Duration::from_secs(10)).unwrap();
        assert_eq!(result.signal, Some(9));
        assert_eq!(result.exit_code, 137);
    }
}
