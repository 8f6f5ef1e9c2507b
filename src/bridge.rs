use std::time::Duration;

use serde_json::json;

use crate::audit::{AuditEvent, AuditLog};
use crate::classify::{binary_missing_result, classify, OpKind, SessionUpdate};
use crate::clipboard;
use crate::config::BridgeConfig;
use crate::error::{ErrorKind, Result};
use crate::resolver::BinaryResolver;
use crate::runner::{self, CommandOutcome, CommandRequest};
use crate::session::SessionStore;
use crate::types::{OperationResult, SecondFactor};

/// Environment variable the vault client reads passwords from.
///
/// Credential material travels only through the environment, never argv, so
/// it cannot leak through process listings.
pub const PASSWORD_ENV_VAR: &str = "BW_PASSWORD";

/// Public contract over the bundled vault client.
///
/// Composes resolver → runner → session store → classifier per call. The
/// bridge mirrors the client's `unauthenticated → locked → unlocked` state
/// machine but never enforces transitions itself: every call is routed to the
/// client and the resulting state is whatever its output reports.
pub struct VaultBridge {
    resolver: BinaryResolver,
    session: SessionStore,
    audit: Option<AuditLog>,
    command_timeout: Duration,
    clipboard_timeout: Duration,
}

impl VaultBridge {
    /// Builds a bridge from validated configuration.
    pub fn new(config: BridgeConfig) -> Result<Self> {
        let audit = match &config.audit_log {
            Some(path) => Some(AuditLog::new(path)?),
            None => None,
        };
        Ok(Self {
            resolver: BinaryResolver::new(config.plugin_dir),
            session: SessionStore::new(),
            audit,
            command_timeout: config.command_timeout,
            clipboard_timeout: config.clipboard_timeout,
        })
    }

    /// Reports whether the bundled binary is usable, with its version.
    pub fn check_availability(&mut self) -> OperationResult {
        let result = match self.resolver.resolve() {
            None => binary_missing_result(&self.resolver.bundled_path()),
            Some(path) => {
                let outcome = runner::run(CommandRequest {
                    program: path.clone(),
                    args: vec!["--version".to_owned()],
                    env_overlay: Vec::new(),
                    stdin: None,
                    timeout: self.command_timeout,
                });
                match outcome {
                    CommandOutcome::Completed {
                        exit_code: 0,
                        stdout,
                        ..
                    } => OperationResult::success(json!({
                        "version": stdout.trim(),
                        "path": path.display().to_string(),
                    })),
                    _ => OperationResult::failure_message(
                        ErrorKind::CommandFailed,
                        "vault client did not report a version",
                    ),
                }
            }
        };
        self.record("check_availability", &result);
        result
    }

    /// Fetches the current vault status. Never cached; always re-fetched.
    pub fn status(&mut self) -> OperationResult {
        self.execute(OpKind::Status, vec!["status".to_owned()], Vec::new())
    }

    /// Logs in with email and password, optionally with a second factor.
    pub fn login(
        &mut self,
        email: &str,
        password: &str,
        second_factor: Option<&SecondFactor>,
    ) -> OperationResult {
        let mut args = vec![
            "login".to_owned(),
            email.to_owned(),
            "--passwordenv".to_owned(),
            PASSWORD_ENV_VAR.to_owned(),
        ];
        if let Some(factor) = second_factor {
            args.push("--method".to_owned());
            args.push(factor.method.to_string());
            args.push("--code".to_owned());
            args.push(factor.code.clone());
        }
        self.execute(
            OpKind::Login,
            args,
            vec![(PASSWORD_ENV_VAR.to_owned(), password.to_owned())],
        )
    }

    /// Unlocks the vault with the master password.
    pub fn unlock(&mut self, master_password: &str) -> OperationResult {
        self.execute(
            OpKind::Unlock,
            vec![
                "unlock".to_owned(),
                "--passwordenv".to_owned(),
                PASSWORD_ENV_VAR.to_owned(),
                "--raw".to_owned(),
            ],
            vec![(PASSWORD_ENV_VAR.to_owned(), master_password.to_owned())],
        )
    }

    /// Locks the vault and drops the held session token.
    pub fn lock(&mut self) -> OperationResult {
        self.execute(OpKind::Lock, vec!["lock".to_owned()], Vec::new())
    }

    /// Logs out and drops the held session token.
    pub fn logout(&mut self) -> OperationResult {
        self.execute(OpKind::Logout, vec!["logout".to_owned()], Vec::new())
    }

    /// Lists all vault items.
    pub fn list_items(&mut self) -> OperationResult {
        self.execute(
            OpKind::ListItems,
            vec!["list".to_owned(), "items".to_owned()],
            Vec::new(),
        )
    }

    /// Fetches one vault item by id.
    pub fn get_item(&mut self, item_id: &str) -> OperationResult {
        self.execute(
            OpKind::GetItem,
            vec!["get".to_owned(), "item".to_owned(), item_id.to_owned()],
            Vec::new(),
        )
    }

    /// Fetches the one-time code for an item.
    pub fn get_totp(&mut self, item_id: &str) -> OperationResult {
        self.execute(
            OpKind::GetTotp,
            vec!["get".to_owned(), "totp".to_owned(), item_id.to_owned()],
            Vec::new(),
        )
    }

    /// Copies text to the system clipboard through the fallback chain.
    ///
    /// Independent of vault state; the text itself is never logged.
    pub fn copy_to_clipboard(&mut self, text: &str) -> OperationResult {
        let result = clipboard::copy_with(text, &clipboard::default_tools(), self.clipboard_timeout);
        let event = match &result.data {
            Some(data) if result.ok => AuditEvent::ClipboardCopied {
                method: data["method"].as_str().unwrap_or("unknown").to_owned(),
            },
            _ => AuditEvent::ClipboardFailed,
        };
        self.audit(event);
        result
    }

    /// Returns `true` while a session token is held in memory.
    pub fn session_active(&self) -> bool {
        self.session.is_active()
    }

    /// Clears the cached binary location, forcing re-resolution.
    pub fn reset_binary_cache(&mut self) {
        self.resolver.reset();
    }

    fn execute(
        &mut self,
        op: OpKind,
        args: Vec<String>,
        extra_env: Vec<(String, String)>,
    ) -> OperationResult {
        let outcome = match self.resolver.resolve() {
            None => {
                let result = binary_missing_result(&self.resolver.bundled_path());
                self.record(op.name(), &result);
                return result;
            }
            Some(program) => {
                let mut env_overlay = self.session.overlay();
                env_overlay.extend(extra_env);
                runner::run(CommandRequest {
                    program,
                    args,
                    env_overlay,
                    stdin: None,
                    timeout: self.command_timeout,
                })
            }
        };

        let classification = classify(op, &outcome);
        match classification.session {
            Some(SessionUpdate::Store(token)) => self.session.set(token),
            Some(SessionUpdate::Clear) => self.session.clear(),
            None => {}
        }
        self.record(op.name(), &classification.result);
        classification.result
    }

    fn record(&self, operation: &str, result: &OperationResult) {
        self.audit(AuditEvent::OperationCompleted {
            operation: operation.to_owned(),
            ok: result.ok,
            error: result.error,
        });
    }

    // Best effort: an audit write failure must not fail a vault operation.
    fn audit(&self, event: AuditEvent) {
        if let Some(log) = &self.audit {
            let _ = log.log(event);
        }
    }
}
