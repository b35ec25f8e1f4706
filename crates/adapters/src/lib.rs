// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: step command execution and environment probes

pub mod command;
pub mod probe;
pub mod traced;

pub use command::{CommandError, CommandOutput, CommandRunner, NoOpCommandRunner, ShellCommandRunner};
pub use probe::{capture, EnvProbe, ProbeError, SystemEnvProbe};
pub use traced::{TracedCommandRunner, TracedEnvProbe};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use command::{CommandCall, FakeCommandRunner};
#[cfg(any(test, feature = "test-support"))]
pub use probe::FakeEnvProbe;
