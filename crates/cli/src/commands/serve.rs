// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wrkr serve` - read-only HTTP status API

use crate::context::Context;
use crate::output;
use anyhow::Result;
use clap::Args;
use serde_json::json;
use std::sync::atomic::Ordering;
use wrkr_core::config::ServeSettings;
use wrkr_core::SystemClock;
use wrkr_serve::Server;

#[derive(Args, Default)]
pub struct ServeArgs {
    /// Listen address (default from config: 127.0.0.1:9488)
    #[arg(long)]
    pub listen: Option<String>,

    /// Worker threads
    #[arg(long)]
    pub workers: Option<usize>,

    /// Permit binding to a non-loopback address (requires --auth-token)
    #[arg(long)]
    pub allow_non_loopback: bool,

    /// Bearer token required on every request
    #[arg(long)]
    pub auth_token: Option<String>,
}

/// Flags take precedence over the configured settings
pub(crate) fn settings(base: &ServeSettings, args: &ServeArgs) -> ServeSettings {
    let mut settings = base.clone();
    if let Some(listen) = &args.listen {
        settings.listen = listen.clone();
    }
    if let Some(workers) = args.workers {
        settings.workers = workers;
    }
    if args.allow_non_loopback {
        settings.allow_non_loopback = true;
    }
    if let Some(token) = &args.auth_token {
        settings.auth_token = Some(token.clone());
    }
    settings
}

pub fn run(ctx: &Context, args: ServeArgs) -> Result<()> {
    let settings = settings(&ctx.config.serve, &args);
    let server = Server::start(ctx.open_store()?, SystemClock, &settings)?;

    let shutdown = server.shutdown_flag();
    ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))?;

    let addr = server.local_addr();
    output::emit(ctx.json, &json!({ "listen": addr.to_string() }), || {
        println!("listening on http://{addr}")
    })?;
    server.wait();
    Ok(())
}
