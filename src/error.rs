use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain outcome kinds surfaced to callers through [`crate::types::OperationResult`].
///
/// The vault client reports failure causes only as free text, so these kinds
/// are the result of best-effort classification; anything unrecognized
/// degrades to [`ErrorKind::CommandFailed`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bundled vault binary could not be resolved.
    #[serde(rename = "BW_BINARY_MISSING")]
    BinaryMissing,
    /// Catch-all for unclassified nonzero exits, timeouts, and malformed output.
    #[serde(rename = "COMMAND_FAILED")]
    CommandFailed,
    /// Email/password or master password was rejected.
    #[serde(rename = "INVALID_CREDENTIALS")]
    InvalidCredentials,
    /// Operation requires a logged-in account.
    #[serde(rename = "NOT_AUTHENTICATED")]
    NotAuthenticated,
    /// Operation requires an unlocked vault.
    #[serde(rename = "LOCKED")]
    Locked,
    /// Login needs a second-factor provider selection and code.
    #[serde(rename = "TWO_FACTOR_REQUIRED")]
    TwoFactorRequired,
    /// The supplied second-factor code was rejected.
    #[serde(rename = "INVALID_2FA_CODE")]
    InvalidTwoFactorCode,
    /// Every clipboard tool in the fallback chain was absent or failed.
    #[serde(rename = "CLIPBOARD_ERROR")]
    ClipboardError,
}

impl ErrorKind {
    /// Returns the stable string tag for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::BinaryMissing => "BW_BINARY_MISSING",
            ErrorKind::CommandFailed => "COMMAND_FAILED",
            ErrorKind::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorKind::NotAuthenticated => "NOT_AUTHENTICATED",
            ErrorKind::Locked => "LOCKED",
            ErrorKind::TwoFactorRequired => "TWO_FACTOR_REQUIRED",
            ErrorKind::InvalidTwoFactorCode => "INVALID_2FA_CODE",
            ErrorKind::ClipboardError => "CLIPBOARD_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal plumbing errors for config and audit handling.
///
/// Vault operations themselves never surface these; every subprocess or parse
/// fault is converted into an [`crate::types::OperationResult`] at its origin.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Input was syntactically valid but semantically unsupported.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// I/O error.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// JSON serialization error.
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// A typed result used across the crate.
pub type Result<T> = std::result::Result<T, BridgeError>;
