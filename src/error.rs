//! Application-level error type.
//!
//! Library operations that can only fail because the caller handed over
//! something unusable return `AppError`; the binary maps `exit_code()` onto the
//! process exit status:
//!
//! - `2`: usage, configuration or I/O problems
//! - `3`: input data that cannot be processed
//! - `4`: a computation that failed for otherwise valid input

use crate::encode::EncodeError;

#[derive(Clone, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl From<EncodeError> for AppError {
    fn from(err: EncodeError) -> Self {
        AppError::new(4, format!("Register encoding failed: {err}"))
    }
}
