// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;
use wrkr_core::ErrorCode;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("refusing to listen on non-loopback address {addr}: {reason}")]
    Unsafe { addr: String, reason: String },
    #[error("invalid listen address {0:?}")]
    InvalidAddress(String),
    #[error("failed to bind {addr}: {message}")]
    Bind { addr: String, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServeError::Unsafe { .. } => ErrorCode::UnsafeOperation,
            ServeError::InvalidAddress(_) => ErrorCode::InvalidInputSchema,
            ServeError::Bind { .. } | ServeError::Io(_) => ErrorCode::GenericFailure,
        }
    }
}
