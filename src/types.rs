use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ErrorKind;

/// Uniform result contract returned by every public vault operation.
///
/// Exactly one of `ok == true` or `error.is_some()` holds; `data` may carry a
/// payload in both outcomes (for example a diagnostic message alongside a
/// failure). The shape serializes to the `{ok, data, error}` wire form the
/// host frontend consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationResult {
    /// Whether the operation reached the state the caller intended.
    pub ok: bool,
    /// Operation-specific payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error kind when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl OperationResult {
    /// Builds a success result with a payload.
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Builds a failure result with an error kind and payload.
    pub fn failure(error: ErrorKind, data: Value) -> Self {
        Self {
            ok: false,
            data: Some(data),
            error: Some(error),
        }
    }

    /// Builds a failure result carrying only a human-readable message.
    pub fn failure_message(error: ErrorKind, message: impl Into<String>) -> Self {
        Self::failure(error, json!({ "message": message.into() }))
    }

    /// Returns the error kind when the operation failed.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error
    }
}

/// Vault authentication state as reported by the vault client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthState {
    /// No account is logged in.
    Unauthenticated,
    /// Logged in, vault contents still encrypted.
    Locked,
    /// Vault contents readable with the active session.
    Unlocked,
}

/// Parsed shape of the vault client's `status` output.
///
/// Used to validate the JSON before it is handed back to the caller; the raw
/// value is always returned verbatim so unknown fields survive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VaultStatus {
    /// Authentication state.
    pub status: AuthState,
    /// Configured server URL.
    #[serde(default)]
    pub server_url: Option<String>,
    /// Last sync timestamp, as reported.
    #[serde(default)]
    pub last_sync: Option<String>,
    /// Logged-in account email.
    #[serde(default)]
    pub user_email: Option<String>,
    /// Logged-in account id.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// One entry of the fixed second-factor provider menu.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SecondFactorProvider {
    /// Provider id as the vault client numbers them.
    pub id: u8,
    /// Human-readable provider name.
    pub name: &'static str,
}

/// Second-factor providers the bridge offers when the vault client demands one.
///
/// The ids match the vault client's `--method` argument values.
pub const SECOND_FACTOR_PROVIDERS: [SecondFactorProvider; 3] = [
    SecondFactorProvider {
        id: 0,
        name: "Authenticator",
    },
    SecondFactorProvider { id: 1, name: "Email" },
    SecondFactorProvider {
        id: 3,
        name: "YubiKey",
    },
];

/// Provider selection plus code for a second-factor login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondFactor {
    /// Provider id from [`SECOND_FACTOR_PROVIDERS`].
    pub method: u8,
    /// One-time code for the selected provider.
    pub code: String,
}

#[cfg(test)]
mod unit_tests {
    use serde_json::json;

    use super::{AuthState, OperationResult, VaultStatus, SECOND_FACTOR_PROVIDERS};
    use crate::error::ErrorKind;

    #[test]
    fn success_sets_ok_without_error() {
        let result = OperationResult::success(json!({"locked": true}));
        assert!(result.ok);
        assert!(result.error.is_none());
        assert_eq!(result.data, Some(json!({"locked": true})));
    }

    #[test]
    fn failure_message_wraps_text() {
        let result = OperationResult::failure_message(ErrorKind::Locked, "vault is locked");
        assert!(!result.ok);
        assert_eq!(result.error, Some(ErrorKind::Locked));
        assert_eq!(result.data, Some(json!({"message": "vault is locked"})));
    }

    #[test]
    fn result_serializes_without_absent_fields() {
        let encoded =
            serde_json::to_string(&OperationResult::success(json!({"logged_in": true}))).unwrap();
        assert_eq!(encoded, r#"{"ok":true,"data":{"logged_in":true}}"#);
    }

    #[test]
    fn status_parses_camel_case_fields() {
        let status: VaultStatus = serde_json::from_str(
            r#"{"serverUrl":"https://vault.bitwarden.com","lastSync":null,
                "userEmail":"user@example.com","userId":"user-123","status":"locked"}"#,
        )
        .unwrap();
        assert_eq!(status.status, AuthState::Locked);
        assert_eq!(status.user_email.as_deref(), Some("user@example.com"));
        assert!(status.last_sync.is_none());
    }

    #[test]
    fn provider_menu_is_fixed() {
        let ids: Vec<u8> = SECOND_FACTOR_PROVIDERS.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1, 3]);
        assert_eq!(SECOND_FACTOR_PROVIDERS[2].name, "YubiKey");
    }
}
