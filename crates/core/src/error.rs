// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stable machine-readable error codes and their process exit codes

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "E_INVALID_INPUT_SCHEMA")]
    InvalidInputSchema,
    #[serde(rename = "E_BUDGET_EXCEEDED")]
    BudgetExceeded,
    #[serde(rename = "E_ADAPTER_FAIL")]
    AdapterFail,
    #[serde(rename = "E_CHECKPOINT_APPROVAL_REQUIRED")]
    ApprovalRequired,
    #[serde(rename = "E_ACCEPT_MISSING_ARTIFACT")]
    AcceptMissingArtifact,
    #[serde(rename = "E_ACCEPT_TEST_FAIL")]
    AcceptTestFail,
    #[serde(rename = "E_VERIFY_HASH_MISMATCH")]
    VerifyHashMismatch,
    #[serde(rename = "E_STORE_CORRUPT")]
    StoreCorrupt,
    #[serde(rename = "E_ENV_FINGERPRINT_MISMATCH")]
    EnvFingerprintMismatch,
    #[serde(rename = "E_LEASE_CONFLICT")]
    LeaseConflict,
    #[serde(rename = "E_JOB_NOT_FOUND")]
    JobNotFound,
    #[serde(rename = "E_UNSAFE_OPERATION")]
    UnsafeOperation,
    #[serde(rename = "E_CANCELLED")]
    Cancelled,
    #[serde(rename = "E_GENERIC_FAILURE")]
    GenericFailure,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidInputSchema => "E_INVALID_INPUT_SCHEMA",
            ErrorCode::BudgetExceeded => "E_BUDGET_EXCEEDED",
            ErrorCode::AdapterFail => "E_ADAPTER_FAIL",
            ErrorCode::ApprovalRequired => "E_CHECKPOINT_APPROVAL_REQUIRED",
            ErrorCode::AcceptMissingArtifact => "E_ACCEPT_MISSING_ARTIFACT",
            ErrorCode::AcceptTestFail => "E_ACCEPT_TEST_FAIL",
            ErrorCode::VerifyHashMismatch => "E_VERIFY_HASH_MISMATCH",
            ErrorCode::StoreCorrupt => "E_STORE_CORRUPT",
            ErrorCode::EnvFingerprintMismatch => "E_ENV_FINGERPRINT_MISMATCH",
            ErrorCode::LeaseConflict => "E_LEASE_CONFLICT",
            ErrorCode::JobNotFound => "E_JOB_NOT_FOUND",
            ErrorCode::UnsafeOperation => "E_UNSAFE_OPERATION",
            ErrorCode::Cancelled => "E_CANCELLED",
            ErrorCode::GenericFailure => "E_GENERIC_FAILURE",
        }
    }

    /// Process exit code for a command failing with this code
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCode::VerifyHashMismatch => 2,
            ErrorCode::ApprovalRequired => 4,
            ErrorCode::AcceptMissingArtifact | ErrorCode::AcceptTestFail => 5,
            ErrorCode::InvalidInputSchema | ErrorCode::JobNotFound => 6,
            ErrorCode::UnsafeOperation => 8,
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON error document shared by the CLI and the HTTP surface:
/// `{"error": {"code", "message", "exit_code", "details"}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    pub exit_code: i32,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl ErrorEnvelope {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code,
                message: message.into(),
                exit_code: code.exit_code(),
                details: serde_json::Value::Object(Default::default()),
            },
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = details;
        self
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
