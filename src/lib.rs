#![deny(missing_docs)]
//! Bwbridge drives the bundled Bitwarden CLI and turns its free-text
//! output into a structured `{ok, data, error}` contract.

/// Audit log module.
pub mod audit;
/// Vault operations facade.
pub mod bridge;
mod classify;
/// Command-line interface.
pub mod cli;
/// Clipboard delivery chain.
pub mod clipboard;
/// Config parsing and validation.
pub mod config;
/// Error types and stable error tags.
pub mod error;
/// Bundled binary resolution.
pub mod resolver;
/// Subprocess execution with timeouts.
pub mod runner;
/// In-memory session token store.
pub mod session;
/// Shared types.
pub mod types;
