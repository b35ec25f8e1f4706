// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wrkr-storage: durable per-job state
//!
//! Each job directory holds an append-only event log. Replaying the log
//! yields the materialized [`JobState`]; the [`JobStore`] keeps an in-memory
//! index of replayed jobs and hands out copy-on-read snapshots.

mod event;
mod lock;
mod retention;
mod state;
mod store;
mod wal;

pub use event::{JobEvent, WalEntry};
pub use lock::BusyLocks;
pub use retention::{prune, PruneEntry, PruneKind, PruneOptions, PruneReason, PruneReport};
pub use state::{Counters, JobState};
pub use store::{JobLease, JobStore, StoreError};
pub use wal::{Scan, Wal, WalError};
