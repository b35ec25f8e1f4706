// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wrkr-serve: read-only HTTP facade over the job store
//!
//! Routes:
//! - `GET /v1/jobs/{job_id}:status`
//! - `GET /v1/jobs/{job_id}/checkpoints`
//! - `GET /v1/jobs/{job_id}/checkpoints/{checkpoint_id}`

mod error;
mod router;
mod server;

pub use error::ServeError;
pub use router::{Reply, Router};
pub use server::{check_listen, Server};
