// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod accept;
pub mod budget;
pub mod demo;
pub mod doctor;
pub mod init;
pub mod job;
pub mod jobpack;
pub mod serve;
pub mod status;
pub mod store;

use crate::output;
use anyhow::Result;
use tokio_util::sync::CancellationToken;
use wrkr_core::JobStatusView;

/// Token cancelled on Ctrl-C; the executor stops at its next admission point
pub(crate) fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let handle = token.clone();
    if let Err(e) = ctrlc::set_handler(move || handle.cancel()) {
        tracing::warn!(error = %e, "cannot install interrupt handler");
    }
    token
}

/// One `key=value` status line, or the full view as JSON
pub(crate) fn print_status(json: bool, view: &JobStatusView) -> Result<()> {
    output::emit(json, view, || println!("{}", status_line(view)))
}

pub(crate) fn status_line(view: &JobStatusView) -> String {
    output::pairs(&[
        ("job_id", view.job_id.clone()),
        ("status", view.status.to_string()),
        ("checkpoints", view.checkpoint_count.to_string()),
        ("steps", format!("{}/{}", view.next_step_index, view.step_total)),
        (
            "last_checkpoint",
            view.last_checkpoint_id.clone().unwrap_or_default(),
        ),
        ("reasons", view.reason_codes.join(",")),
    ])
}
