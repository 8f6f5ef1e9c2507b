use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{ErrorKind, Result};

#[cfg(unix)]
const PRIVATE_FILE_MODE: u32 = 0o600;

/// Audit events emitted by the bridge.
///
/// Events record which operation ran and how it ended, never its inputs or
/// payloads: no passwords, session tokens, or item contents reach the log.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A vault operation completed.
    OperationCompleted {
        /// Operation name.
        operation: String,
        /// Whether the operation succeeded.
        ok: bool,
        /// Error kind on failure.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<ErrorKind>,
    },
    /// Text was delivered to the system clipboard.
    ClipboardCopied {
        /// Clipboard tool that accepted the text.
        method: String,
    },
    /// Every clipboard tool in the chain was absent or failed.
    ClipboardFailed,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct AuditLine {
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    event: AuditEvent,
}

/// JSONL append-only audit log writer.
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    /// Creates a new audit log at `path`, creating the file if missing.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut permissions = file.metadata()?.permissions();
            permissions.set_mode(PRIVATE_FILE_MODE);
            std::fs::set_permissions(&file_path, permissions)?;
        }
        #[cfg(not(unix))]
        drop(file);

        Ok(Self { path: file_path })
    }

    /// Appends one event as a JSON line.
    pub fn log(&self, event: AuditEvent) -> Result<()> {
        let line = AuditLine {
            timestamp: Utc::now(),
            event,
        };

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        serde_json::to_writer(&mut file, &line)?;
        file.write_all(b"\n")?;
        Ok(())
    }

    /// Returns the audit file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
