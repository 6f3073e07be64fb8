// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Embedded allocation workload and its compilation into a scratch classpath
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests below; staging against a real `javac` is not exercised in CI

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use crate::error::{HarnessError, Result};
use crate::invocation::{ArgumentList, Launcher};
use crate::runner;

/// Entry point of the embedded workload.
pub const WORKLOAD_CLASS: &str = "GarbageProducer";

/// Source of the embedded workload.
pub const WORKLOAD_SOURCE: &str = include_str!("../workload/GarbageProducer.java");

/// Compiled workload; the class directory is removed on drop.
#[derive(Debug)]
pub struct StagedWorkload {
    dir: TempDir,
}

impl StagedWorkload {
    pub fn classpath(&self) -> &Path {
        self.dir.path()
    }
}

/// `javac` living next to `java`, or plain `javac` when `java` is a bare name.
pub fn javac_for(java: &Path) -> PathBuf {
    let javac = format!("javac{}", std::env::consts::EXE_SUFFIX);
    match java.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(javac),
        _ => PathBuf::from(javac),
    }
}

/// Writes the embedded source to a scratch directory and compiles it there.
pub fn stage(javac: &Path, timeout: Duration) -> Result<StagedWorkload> {
    let dir = tempfile::Builder::new()
        .prefix("verify-gc-flags-")
        .tempdir()
        .map_err(|err| HarnessError::Staging(format!("scratch directory: {err}")))?;
    let source = dir.path().join(format!("{WORKLOAD_CLASS}.java"));
    fs::write(&source, WORKLOAD_SOURCE)
        .map_err(|err| HarnessError::Staging(format!("write {}: {err}", source.display())))?;

    let arguments = ArgumentList::new(vec![
        "-d".to_string(),
        dir.path().display().to_string(),
        source.display().to_string(),
    ]);
    log::info!("compiling {WORKLOAD_CLASS} with {}", javac.display());
    let compiled = runner::run(&Launcher::new(javac), &arguments, timeout)?;
    if compiled.exit_code != 0 {
        return Err(HarnessError::Staging(format!(
            "{} exited with {}: {}",
            javac.display(),
            compiled.exit_code,
            compiled.text.trim()
        )));
    }

    let class_file = dir.path().join(format!("{WORKLOAD_CLASS}.class"));
    if !class_file.is_file() {
        return Err(HarnessError::Staging(format!("{} was not produced", class_file.display())));
    }
    Ok(StagedWorkload { dir })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_source_declares_the_entry_point() {
        assert!(WORKLOAD_SOURCE.contains(&format!("public class {WORKLOAD_CLASS}")));
        assert!(WORKLOAD_SOURCE.contains("new long[10000]"));
    }

    #[test]
    fn javac_sits_next_to_java() {
        let javac = javac_for(Path::new("/opt/jdk/bin/java"));
        assert_eq!(javac.parent(), Some(Path::new("/opt/jdk/bin")));
        assert!(javac.file_name().unwrap().to_string_lossy().starts_with("javac"));
        assert_eq!(javac_for(Path::new("java")), PathBuf::from(format!("javac{}", std::env::consts::EXE_SUFFIX)));
    }

    #[test]
    fn missing_compiler_surfaces_spawn_error() {
        let err = stage(Path::new("/nonexistent/verify-gc-flags/javac"), Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, HarnessError::Spawn { .. }), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn failing_compiler_is_a_staging_error() {
        let err = stage(Path::new("false"), Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, HarnessError::Staging(_)), "{err}");
    }
}
