use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::bridge::{VaultBridge, PASSWORD_ENV_VAR};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::types::{OperationResult, SecondFactor};

const CLI_AFTER_HELP: &str = r#"Examples:
  bwbridge --plugin-dir ~/homebrew/plugins/bitwarden check
  bwbridge --plugin-dir ~/homebrew/plugins/bitwarden status
  BW_PASSWORD=... bwbridge --plugin-dir <dir> login user@example.com
  BW_PASSWORD=... bwbridge --plugin-dir <dir> unlock
  bwbridge --plugin-dir <dir> totp item-001
  printf 'secret' | bwbridge --plugin-dir <dir> copy

Every command prints one JSON object of the form {"ok":..,"data":..,"error":..}
and exits 0 when ok is true, 1 otherwise. Passwords are read from the
BW_PASSWORD environment variable, never from arguments.
"#;

/// Top-level command line parser.
#[derive(Debug, Parser)]
#[command(
    name = "bwbridge",
    version,
    about = "Bridge the bundled Bitwarden CLI into structured vault operations.",
    after_help = CLI_AFTER_HELP,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Plugin directory that bundles the vault binary.
    #[arg(long)]
    pub plugin_dir: Option<PathBuf>,
    /// Config file path (`bwbridge.toml`).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Audit log path override.
    #[arg(long)]
    pub audit_log: Option<PathBuf>,
    /// Subcommand.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands, one per bridge operation.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Report bundled binary availability and version.
    Check,
    /// Report vault authentication status.
    Status,
    /// Log in; the password is read from the BW_PASSWORD environment variable.
    Login {
        /// Account email address.
        email: String,
        /// Second-factor provider id (0 Authenticator, 1 Email, 3 YubiKey).
        #[arg(long, requires = "code")]
        method: Option<u8>,
        /// Second-factor code.
        #[arg(long, requires = "method")]
        code: Option<String>,
    },
    /// Unlock the vault; the master password is read from BW_PASSWORD.
    Unlock,
    /// Lock the vault.
    Lock,
    /// Log out of the account.
    Logout,
    /// List all vault items.
    Items,
    /// Get one vault item by id.
    Item {
        /// Vault item id.
        item_id: String,
    },
    /// Get the one-time code for a vault item.
    Totp {
        /// Vault item id.
        item_id: String,
    },
    /// Copy text from stdin to the system clipboard.
    Copy,
}

/// Runs one CLI invocation and returns the process exit code.
pub fn run(cli: Cli) -> Result<i32> {
    let config = resolve_config(&cli)?;
    let mut bridge = VaultBridge::new(config)?;

    let result = match cli.command {
        Command::Check => bridge.check_availability(),
        Command::Status => bridge.status(),
        Command::Login {
            email,
            method,
            code,
        } => {
            let password = read_password()?;
            let second_factor = match (method, code) {
                (Some(method), Some(code)) => Some(SecondFactor { method, code }),
                _ => None,
            };
            bridge.login(&email, &password, second_factor.as_ref())
        }
        Command::Unlock => {
            let password = read_password()?;
            bridge.unlock(&password)
        }
        Command::Lock => bridge.lock(),
        Command::Logout => bridge.logout(),
        Command::Items => bridge.list_items(),
        Command::Item { item_id } => bridge.get_item(&item_id),
        Command::Totp { item_id } => bridge.get_totp(&item_id),
        Command::Copy => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            bridge.copy_to_clipboard(&text)
        }
    };

    print_result(&result)?;
    Ok(if result.ok { 0 } else { 1 })
}

fn resolve_config(cli: &Cli) -> Result<BridgeConfig> {
    let mut config = match &cli.config {
        Some(path) => BridgeConfig::load_from_path(path)?,
        None => {
            let plugin_dir = cli.plugin_dir.as_ref().ok_or_else(|| {
                BridgeError::InvalidInput(
                    "plugin directory not set; pass --plugin-dir or --config".to_owned(),
                )
            })?;
            BridgeConfig::new(plugin_dir)
        }
    };

    // Flags win over file values.
    if let Some(plugin_dir) = &cli.plugin_dir {
        config.plugin_dir = plugin_dir.clone();
    }
    if let Some(audit_log) = &cli.audit_log {
        config.audit_log = Some(audit_log.clone());
    }
    Ok(config)
}

fn read_password() -> Result<String> {
    std::env::var(PASSWORD_ENV_VAR).map_err(|_| {
        BridgeError::InvalidInput(format!("{PASSWORD_ENV_VAR} is not set in the environment"))
    })
}

fn print_result(result: &OperationResult) -> Result<()> {
    let encoded = serde_json::to_string(result)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match handle
        .write_all(encoded.as_bytes())
        .and_then(|_| handle.write_all(b"\n"))
        .and_then(|_| handle.flush())
    {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(error) => Err(error.into()),
    }
}
