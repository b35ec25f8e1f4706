// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request routing, independent of the HTTP listener

use serde_json::{json, Value};
use std::sync::Arc;
use wrkr_core::id::is_valid_job_id;
use wrkr_core::{Clock, ErrorCode, ErrorEnvelope};
use wrkr_storage::{JobStore, StoreError};

const JOBS_PREFIX: &str = "/v1/jobs/";

/// Status code and JSON body of a response
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, code: ErrorCode, message: impl Into<String>) -> Self {
        let envelope = ErrorEnvelope::new(code, message);
        Self {
            status,
            body: serde_json::to_value(envelope).unwrap_or(Value::Null),
        }
    }
}

#[derive(Clone, Copy)]
enum Route<'a> {
    Status(&'a str),
    Checkpoints(&'a str),
    Checkpoint(&'a str, &'a str),
}

fn parse(path: &str) -> Option<Route<'_>> {
    let rest = path.strip_prefix(JOBS_PREFIX)?;
    if let Some(id) = rest.strip_suffix(":status") {
        return (!id.contains('/')).then_some(Route::Status(id));
    }
    let mut parts = rest.split('/');
    let id = parts.next()?;
    match (parts.next(), parts.next(), parts.next()) {
        (Some("checkpoints"), None, None) => Some(Route::Checkpoints(id)),
        (Some("checkpoints"), Some(cp), None) if !cp.is_empty() => {
            Some(Route::Checkpoint(id, cp))
        }
        _ => None,
    }
}

/// Read-only request handler over a job store
#[derive(Clone)]
pub struct Router<C: Clock> {
    store: Arc<JobStore>,
    clock: C,
    token: Option<String>,
}

impl<C: Clock> Router<C> {
    /// `token`, when set, must be presented as `Authorization: Bearer <token>`
    pub fn new(store: Arc<JobStore>, clock: C, token: Option<String>) -> Self {
        Self {
            store,
            clock,
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Answer one request; `authorization` is the raw header value
    pub fn handle(&self, method: &str, url: &str, authorization: Option<&str>) -> Reply {
        if let Some(token) = &self.token {
            let presented = authorization.and_then(|h| h.trim().strip_prefix("Bearer "));
            if presented.map(str::trim) != Some(token.as_str()) {
                return Reply::error(
                    401,
                    ErrorCode::UnsafeOperation,
                    "missing or invalid bearer token",
                );
            }
        }
        self.dispatch(method, url)
    }

    fn dispatch(&self, method: &str, url: &str) -> Reply {
        let path = url.split('?').next().unwrap_or_default();
        let Some(route) = parse(path) else {
            return Reply::error(404, ErrorCode::JobNotFound, format!("no route for {path}"));
        };
        if !method.eq_ignore_ascii_case("GET") {
            return Reply::error(
                405,
                ErrorCode::UnsafeOperation,
                format!("method {method} not allowed; the API is read-only"),
            );
        }

        let job_id = match route {
            Route::Status(id) | Route::Checkpoints(id) | Route::Checkpoint(id, _) => id,
        };
        if !is_valid_job_id(job_id) {
            return Reply::error(
                400,
                ErrorCode::InvalidInputSchema,
                format!("invalid job id {job_id:?}"),
            );
        }

        let state = match self.store.snapshot(job_id) {
            Ok(state) => state,
            Err(e) => return store_failure(&e),
        };
        match route {
            Route::Status(_) => {
                let view = state.status_view(self.clock.now());
                match serde_json::to_value(view) {
                    Ok(body) => Reply::ok(body),
                    Err(e) => Reply::error(500, ErrorCode::GenericFailure, e.to_string()),
                }
            }
            Route::Checkpoints(_) => {
                let list: Vec<Value> = state
                    .checkpoints
                    .iter()
                    .filter_map(|cp| serde_json::to_value(&**cp).ok())
                    .collect();
                Reply::ok(json!(list))
            }
            Route::Checkpoint(_, checkpoint_id) => match state.checkpoint(checkpoint_id) {
                Some(cp) => match serde_json::to_value(&**cp) {
                    Ok(body) => Reply::ok(body),
                    Err(e) => Reply::error(500, ErrorCode::GenericFailure, e.to_string()),
                },
                None => Reply::error(
                    404,
                    ErrorCode::JobNotFound,
                    format!("checkpoint {checkpoint_id} not found in job {job_id}"),
                ),
            },
        }
    }
}

fn store_failure(err: &StoreError) -> Reply {
    let status = match err {
        StoreError::JobNotFound(_) => 404,
        StoreError::InvalidJobId(_) => 400,
        _ => 500,
    };
    Reply::error(status, err.code(), err.to_string())
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
