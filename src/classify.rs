//! Heuristic classification of raw command outcomes into domain results.
//!
//! The vault client communicates failure causes only through free-text
//! stderr/stdout, never through distinct exit codes, so this module is an
//! ordered substring table per operation over the lower-cased combined
//! output. Classification stays a pure function: session-store effects are
//! returned as data for the facade to apply.

use serde_json::{json, Value};

use crate::error::ErrorKind;
use crate::runner::CommandOutcome;
use crate::types::{OperationResult, VaultStatus, SECOND_FACTOR_PROVIDERS};

/// Logical operation the raw outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpKind {
    Status,
    Login,
    Unlock,
    Lock,
    Logout,
    ListItems,
    GetItem,
    GetTotp,
}

impl OpKind {
    /// Stable operation name used in audit events.
    pub(crate) fn name(self) -> &'static str {
        match self {
            OpKind::Status => "status",
            OpKind::Login => "login",
            OpKind::Unlock => "unlock",
            OpKind::Lock => "lock",
            OpKind::Logout => "logout",
            OpKind::ListItems => "list_items",
            OpKind::GetItem => "get_item",
            OpKind::GetTotp => "get_totp",
        }
    }
}

/// Session-store effect a classified outcome asks the facade to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionUpdate {
    /// Store a fresh session token.
    Store(String),
    /// Drop the held token.
    Clear,
}

/// Classified outcome plus the session effect it implies.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Classification {
    pub(crate) result: OperationResult,
    pub(crate) session: Option<SessionUpdate>,
}

impl Classification {
    fn plain(result: OperationResult) -> Self {
        Self {
            result,
            session: None,
        }
    }

    fn with_session(result: OperationResult, update: SessionUpdate) -> Self {
        Self {
            result,
            session: Some(update),
        }
    }
}

/// Guidance payload for an unresolved vault binary.
pub(crate) fn binary_missing_result(expected_path: &std::path::Path) -> OperationResult {
    OperationResult::failure_message(
        ErrorKind::BinaryMissing,
        format!(
            "Bitwarden CLI (bw) not found. Expected bundled binary at {}.",
            expected_path.display()
        ),
    )
}

/// Maps one raw outcome to a domain result.
///
/// Binary-missing outcomes short-circuit before any text inspection. For
/// everything else the rules run against the lower-cased concatenation of
/// stdout and stderr, most specific substring first, and degrade to
/// [`ErrorKind::CommandFailed`] when nothing matches.
pub(crate) fn classify(op: OpKind, outcome: &CommandOutcome) -> Classification {
    let (exit_code, stdout, stderr) = match outcome {
        CommandOutcome::BinaryMissing => {
            return Classification::plain(OperationResult::failure_message(
                ErrorKind::BinaryMissing,
                "Bitwarden CLI (bw) not found in the plugin's bundled paths.",
            ));
        }
        CommandOutcome::Completed {
            exit_code,
            stdout,
            stderr,
        } => (*exit_code, stdout.as_str(), stderr.as_str()),
    };
    let text = format!("{stdout}\n{stderr}").to_lowercase();

    match op {
        OpKind::Status => classify_status(exit_code, stdout, stderr),
        OpKind::Login => classify_login(exit_code, stdout, stderr, &text),
        OpKind::Unlock => classify_unlock(exit_code, stdout, stderr, &text),
        OpKind::Lock => classify_lock(exit_code, stdout, stderr),
        OpKind::Logout => classify_logout(exit_code, stdout, stderr, &text),
        OpKind::ListItems | OpKind::GetItem => classify_item_read(op, exit_code, stdout, stderr, &text),
        OpKind::GetTotp => classify_totp(exit_code, stdout, stderr, &text),
    }
}

fn classify_status(exit_code: i32, stdout: &str, stderr: &str) -> Classification {
    if exit_code != 0 {
        return Classification::plain(command_failed(
            "vault status check failed",
            exit_code,
            stdout,
            stderr,
        ));
    }
    match serde_json::from_str::<Value>(stdout) {
        // The raw value goes back verbatim; the typed parse only validates shape.
        Ok(value) if serde_json::from_value::<VaultStatus>(value.clone()).is_ok() => {
            Classification::plain(OperationResult::success(value))
        }
        _ => Classification::plain(command_failed(
            "vault client returned malformed status output",
            exit_code,
            stdout,
            stderr,
        )),
    }
}

fn classify_login(exit_code: i32, stdout: &str, stderr: &str, text: &str) -> Classification {
    if exit_code == 0 {
        let token = stdout.trim();
        // A bare non-JSON line on stdout is a session token handed back directly.
        if !token.is_empty() && !token.starts_with('{') && !token.starts_with('[') {
            return Classification::with_session(
                OperationResult::success(json!({"logged_in": true, "session_key": token})),
                SessionUpdate::Store(token.to_owned()),
            );
        }
        return Classification::plain(OperationResult::success(json!({"logged_in": true})));
    }

    // Specific substrings first: the generic "invalid" rule would otherwise
    // shadow the two-step-code message.
    if text.contains("two-step login code is invalid") {
        return Classification::plain(OperationResult::failure_message(
            ErrorKind::InvalidTwoFactorCode,
            "two-step login code was rejected",
        ));
    }
    if text.contains("no provider selected") {
        return Classification::plain(OperationResult::failure(
            ErrorKind::TwoFactorRequired,
            json!({
                "message": "two-step login required",
                "providers": SECOND_FACTOR_PROVIDERS.as_slice(),
            }),
        ));
    }
    if text.contains("already logged in") {
        return Classification::plain(OperationResult::success(
            json!({"logged_in": true, "already": true}),
        ));
    }
    if text.contains("invalid master password")
        || text.contains("invalid")
        || text.contains("incorrect")
    {
        return Classification::plain(OperationResult::failure_message(
            ErrorKind::InvalidCredentials,
            "email or master password was rejected",
        ));
    }
    Classification::plain(command_failed("login failed", exit_code, stdout, stderr))
}

fn classify_unlock(exit_code: i32, stdout: &str, stderr: &str, text: &str) -> Classification {
    if exit_code == 0 {
        let token = stdout.trim();
        if token.is_empty() {
            return Classification::plain(OperationResult::success(json!({"unlocked": true})));
        }
        return Classification::with_session(
            OperationResult::success(json!({"unlocked": true, "session_key": token})),
            SessionUpdate::Store(token.to_owned()),
        );
    }

    if text.contains("already unlocked") {
        return Classification::plain(OperationResult::success(
            json!({"unlocked": true, "already": true}),
        ));
    }
    if text.contains("not logged in") {
        return Classification::plain(OperationResult::failure_message(
            ErrorKind::NotAuthenticated,
            "log in before unlocking the vault",
        ));
    }
    if text.contains("invalid") || text.contains("incorrect") {
        return Classification::plain(OperationResult::failure_message(
            ErrorKind::InvalidCredentials,
            "master password was rejected",
        ));
    }
    Classification::plain(command_failed("unlock failed", exit_code, stdout, stderr))
}

fn classify_lock(exit_code: i32, stdout: &str, stderr: &str) -> Classification {
    if exit_code == 0 {
        return Classification::with_session(
            OperationResult::success(json!({"locked": true})),
            SessionUpdate::Clear,
        );
    }
    Classification::plain(command_failed("lock failed", exit_code, stdout, stderr))
}

fn classify_logout(exit_code: i32, stdout: &str, stderr: &str, text: &str) -> Classification {
    if exit_code == 0 {
        return Classification::with_session(
            OperationResult::success(json!({"logged_out": true})),
            SessionUpdate::Clear,
        );
    }
    // End state matches caller intent, so report idempotent success.
    if text.contains("not logged in") {
        return Classification::with_session(
            OperationResult::success(json!({"logged_out": true, "already": true})),
            SessionUpdate::Clear,
        );
    }
    Classification::plain(command_failed("logout failed", exit_code, stdout, stderr))
}

fn classify_item_read(
    op: OpKind,
    exit_code: i32,
    stdout: &str,
    stderr: &str,
    text: &str,
) -> Classification {
    if exit_code == 0 {
        return match serde_json::from_str::<Value>(stdout) {
            Ok(value) => Classification::plain(OperationResult::success(value)),
            Err(_) => Classification::plain(command_failed(
                "vault client returned malformed item output",
                exit_code,
                stdout,
                stderr,
            )),
        };
    }
    if let Some(result) = auth_gate(text) {
        return Classification::plain(result);
    }
    if text.contains("not found") {
        return Classification::plain(OperationResult::failure_message(
            ErrorKind::CommandFailed,
            "item not found",
        ));
    }
    let message = match op {
        OpKind::ListItems => "listing items failed",
        _ => "reading item failed",
    };
    Classification::plain(command_failed(message, exit_code, stdout, stderr))
}

fn classify_totp(exit_code: i32, stdout: &str, stderr: &str, text: &str) -> Classification {
    if exit_code == 0 {
        return Classification::plain(OperationResult::success(
            json!({"totp": stdout.trim()}),
        ));
    }
    if let Some(result) = auth_gate(text) {
        return Classification::plain(result);
    }
    if text.contains("no totp") || text.contains("not found") {
        return Classification::plain(OperationResult::failure_message(
            ErrorKind::CommandFailed,
            "no code available for this item",
        ));
    }
    Classification::plain(command_failed(
        "one-time code retrieval failed",
        exit_code,
        stdout,
        stderr,
    ))
}

/// Shared locked/not-logged-in checks for vault-content reads.
fn auth_gate(text: &str) -> Option<OperationResult> {
    if text.contains("not logged in") {
        return Some(OperationResult::failure_message(
            ErrorKind::NotAuthenticated,
            "log in before reading the vault",
        ));
    }
    if text.contains("locked") {
        return Some(OperationResult::failure_message(
            ErrorKind::Locked,
            "unlock the vault first",
        ));
    }
    None
}

fn command_failed(message: &str, exit_code: i32, stdout: &str, stderr: &str) -> OperationResult {
    OperationResult::failure(
        ErrorKind::CommandFailed,
        json!({
            "message": message,
            "returncode": exit_code,
            "stdout": stdout,
            "stderr": stderr,
        }),
    )
}
