use std::path::PathBuf;
use std::time::Duration;

use serde_json::json;

use crate::error::ErrorKind;
use crate::runner::{self, CommandRequest};
use crate::types::OperationResult;

/// Default budget for one clipboard tool invocation.
pub const CLIPBOARD_TIMEOUT: Duration = Duration::from_secs(5);

/// One external clipboard tool invocation recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardTool {
    /// Reported tool name (`method` in the success payload).
    pub name: String,
    /// Program to execute; bare names are looked up on PATH.
    pub program: PathBuf,
    /// Arguments selecting the clipboard target.
    pub args: Vec<String>,
}

impl ClipboardTool {
    fn new(name: &str, args: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            program: PathBuf::from(name),
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
        }
    }
}

/// The fixed fallback chain: Wayland first, then the two X11 tools.
pub fn default_tools() -> Vec<ClipboardTool> {
    vec![
        ClipboardTool::new("wl-copy", &[]),
        ClipboardTool::new("xclip", &["-selection", "clipboard"]),
        ClipboardTool::new("xsel", &["--clipboard", "--input"]),
    ]
}

/// Copies `text` to the system clipboard through the default tool chain.
pub fn copy(text: &str) -> OperationResult {
    copy_with(text, &default_tools(), CLIPBOARD_TIMEOUT)
}

/// Copies `text` using an explicit tool chain.
///
/// Tools are tried strictly in order. A tool that is not installed is
/// skipped without invocation; an installed tool gets `text` on stdin under
/// `timeout`. The first zero exit wins and the payload names the tool as
/// `method`. The tool list is injectable so tests can point at fake scripts.
pub fn copy_with(text: &str, tools: &[ClipboardTool], timeout: Duration) -> OperationResult {
    for tool in tools {
        let Some(program) = locate(tool) else {
            continue;
        };
        let outcome = runner::run(CommandRequest {
            program,
            args: tool.args.clone(),
            env_overlay: Vec::new(),
            stdin: Some(text.as_bytes().to_vec()),
            timeout,
        });
        if outcome.succeeded() {
            return OperationResult::success(json!({"copied": true, "method": tool.name}));
        }
    }
    OperationResult::failure_message(
        ErrorKind::ClipboardError,
        "no clipboard tool succeeded (tried wl-copy, xclip, xsel)",
    )
}

fn locate(tool: &ClipboardTool) -> Option<PathBuf> {
    if tool.program.is_absolute() {
        return tool.program.is_file().then(|| tool.program.clone());
    }
    which::which(&tool.program).ok()
}
