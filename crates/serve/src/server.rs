// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP listener and worker pool

use crate::error::ServeError;
use crate::router::Router;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use wrkr_core::config::ServeSettings;
use wrkr_core::Clock;
use wrkr_storage::JobStore;

/// How often idle workers look at the shutdown flag
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Resolve the listen address, refusing non-loopback hosts unless they are
/// explicitly allowed and protected by a token.
pub fn check_listen(settings: &ServeSettings) -> Result<SocketAddr, ServeError> {
    let invalid = || ServeError::InvalidAddress(settings.listen.clone());
    let addrs: Vec<SocketAddr> = settings
        .listen
        .to_socket_addrs()
        .map_err(|_| invalid())?
        .collect();
    let first = addrs.first().copied().ok_or_else(invalid)?;
    if addrs.iter().all(|a| a.ip().is_loopback()) {
        return Ok(first);
    }
    if !settings.allow_non_loopback {
        return Err(ServeError::Unsafe {
            addr: settings.listen.clone(),
            reason: "pass --allow-non-loopback to expose the API".to_string(),
        });
    }
    if settings.auth_token.as_deref().map_or(true, str::is_empty) {
        return Err(ServeError::Unsafe {
            addr: settings.listen.clone(),
            reason: "an --auth-token is required off loopback".to_string(),
        });
    }
    Ok(first)
}

/// A running listener with its worker threads
pub struct Server {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl Server {
    /// Bind and start `settings.workers` threads sharing one listener
    pub fn start<C: Clock>(
        store: Arc<JobStore>,
        clock: C,
        settings: &ServeSettings,
    ) -> Result<Self, ServeError> {
        let addr = check_listen(settings)?;
        let http = tiny_http::Server::http(addr).map_err(|e| ServeError::Bind {
            addr: settings.listen.clone(),
            message: e.to_string(),
        })?;
        let addr = http.server_addr().to_ip().unwrap_or(addr);
        let http = Arc::new(http);
        let router = Router::new(store, clock, settings.auth_token.clone());
        let shutdown = Arc::new(AtomicBool::new(false));

        let count = settings.workers.max(1);
        let mut workers = Vec::with_capacity(count);
        for i in 0..count {
            let http = Arc::clone(&http);
            let router = router.clone();
            let shutdown = Arc::clone(&shutdown);
            let handle = std::thread::Builder::new()
                .name(format!("wrkr-serve-{i}"))
                .spawn(move || worker_loop(&http, &router, &shutdown))?;
            workers.push(handle);
        }

        info!(%addr, workers = count, "listening");
        Ok(Self {
            addr,
            shutdown,
            workers,
        })
    }

    /// The bound address (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Flag that stops every worker once set
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Block until the shutdown flag is set and all workers exit
    pub fn wait(self) {
        for worker in self.workers {
            if worker.join().is_err() {
                warn!("serve worker panicked");
            }
        }
        info!(addr = %self.addr, "stopped");
    }

    pub fn stop(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.wait();
    }
}

fn worker_loop<C: Clock>(http: &tiny_http::Server, router: &Router<C>, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::SeqCst) {
        match http.recv_timeout(POLL_INTERVAL) {
            Ok(Some(request)) => respond(router, request),
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "accept failed");
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

fn respond<C: Clock>(router: &Router<C>, request: tiny_http::Request) {
    let started = Instant::now();
    let method = request.method().to_string();
    let url = request.url().to_string();
    let authorization = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Authorization"))
        .map(|h| h.value.as_str().to_string());

    let reply = router.handle(&method, &url, authorization.as_deref());
    let body = serde_json::to_vec(&reply.body).unwrap_or_default();
    let mut response = tiny_http::Response::from_data(body).with_status_code(reply.status);
    if let Ok(header) = "Content-Type: application/json".parse::<tiny_http::Header>() {
        response = response.with_header(header);
    }
    if let Err(e) = request.respond(response) {
        debug!(error = %e, "client went away");
    }
    debug!(
        %method,
        %url,
        status = reply.status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
