//! Uniform response envelope and error classification.
//!
//! Clients branch on `status`/`error`, never on `message` text. The table
//! below is part of the public contract:
//!
//! | kind                  | status | error                 | HTTP |
//! |-----------------------|--------|-----------------------|------|
//! | success               | 0      | OK                    | 200  |
//! | validation            | 1001   | VALIDATION_ERROR      | 400  |
//! | unsupported operation | 1002   | UNSUPPORTED_OPERATION | 400  |
//! | submission rejected   | 2001   | SUBMISSION_ERROR      | 502  |
//! | ledger revert         | 2002   | LEDGER_REVERT         | 422  |
//! | confirmation timeout  | 2003   | CONFIRMATION_TIMEOUT  | 504  |
//! | ledger unavailable    | 2004   | LEDGER_UNAVAILABLE    | 503  |
//! | call failed           | 2005   | CALL_FAILED           | 502  |
//! | history store failure | 3001   | STORAGE_ERROR         | 500  |
//! | internal              | 9001   | INTERNAL_ERROR        | 500  |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::orchestrator::WalletError;

/// `{status, message, error}` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralResponse {
    pub status: i32,
    pub message: String,
    pub error: String,
}

impl GeneralResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: ErrorKind::Success.status(),
            message: message.into(),
            error: ErrorKind::Success.code().to_string(),
        }
    }

    pub fn new(status: i32, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error: error.into(),
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind.status(), message, kind.code())
    }

    /// One envelope for all field failures, messages joined with `,`.
    pub fn from_validation<S: AsRef<str>>(errors: &[S]) -> Self {
        let message = errors
            .iter()
            .map(|e| e.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        Self::failure(ErrorKind::Validation, message)
    }

    pub fn is_ok(&self) -> bool {
        self.status == ErrorKind::Success.status()
    }
}

/// Failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Success,
    Validation,
    Unsupported,
    Submission,
    Revert,
    Timeout,
    Unavailable,
    CallFailed,
    Storage,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> i32 {
        match self {
            ErrorKind::Success => 0,
            ErrorKind::Validation => 1001,
            ErrorKind::Unsupported => 1002,
            ErrorKind::Submission => 2001,
            ErrorKind::Revert => 2002,
            ErrorKind::Timeout => 2003,
            ErrorKind::Unavailable => 2004,
            ErrorKind::CallFailed => 2005,
            ErrorKind::Storage => 3001,
            ErrorKind::Internal => 9001,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Success => "OK",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Unsupported => "UNSUPPORTED_OPERATION",
            ErrorKind::Submission => "SUBMISSION_ERROR",
            ErrorKind::Revert => "LEDGER_REVERT",
            ErrorKind::Timeout => "CONFIRMATION_TIMEOUT",
            ErrorKind::Unavailable => "LEDGER_UNAVAILABLE",
            ErrorKind::CallFailed => "CALL_FAILED",
            ErrorKind::Storage => "STORAGE_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(self) -> StatusCode {
        match self {
            ErrorKind::Success => StatusCode::OK,
            ErrorKind::Validation | ErrorKind::Unsupported => StatusCode::BAD_REQUEST,
            ErrorKind::Submission | ErrorKind::CallFailed => StatusCode::BAD_GATEWAY,
            ErrorKind::Revert => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Storage | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn of(err: &WalletError) -> Self {
        match err {
            WalletError::Validation(_) => ErrorKind::Validation,
            WalletError::Unsupported(_) => ErrorKind::Unsupported,
            WalletError::Submission(_) => ErrorKind::Submission,
            WalletError::Reverted { .. } => ErrorKind::Revert,
            WalletError::ConfirmationTimeout { .. } => ErrorKind::Timeout,
            WalletError::LedgerUnavailable(_) => ErrorKind::Unavailable,
            WalletError::CallFailed(_) => ErrorKind::CallFailed,
            WalletError::Store(_) => ErrorKind::Storage,
            WalletError::InvalidTransition(_) | WalletError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl IntoResponse for GeneralResponse {
    fn into_response(self) -> Response {
        let status = if self.is_ok() {
            StatusCode::OK
        } else {
            ErrorKind::ALL
                .into_iter()
                .find(|k| k.status() == self.status)
                .map(ErrorKind::http_status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        };
        (status, Json(self)).into_response()
    }
}

impl ErrorKind {
    const ALL: [ErrorKind; 10] = [
        ErrorKind::Success,
        ErrorKind::Validation,
        ErrorKind::Unsupported,
        ErrorKind::Submission,
        ErrorKind::Revert,
        ErrorKind::Timeout,
        ErrorKind::Unavailable,
        ErrorKind::CallFailed,
        ErrorKind::Storage,
        ErrorKind::Internal,
    ];
}

impl IntoResponse for WalletError {
    fn into_response(self) -> Response {
        let kind = ErrorKind::of(&self);
        let body = match &self {
            WalletError::Validation(errors) => GeneralResponse::from_validation(errors.as_slice()),
            other => GeneralResponse::failure(kind, other.to_string()),
        };
        (kind.http_status(), Json(body)).into_response()
    }
}
