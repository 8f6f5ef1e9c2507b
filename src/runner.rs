use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Synthetic stderr text for a command that exceeded its timeout budget.
pub const TIMED_OUT_STDERR: &str = "Command timed out";

/// One subprocess invocation: program, ordered arguments, environment overlay
/// (wins over the inherited environment on key collision), optional stdin
/// payload, and a hard timeout.
#[derive(Debug)]
pub struct CommandRequest {
    /// Absolute path of the program to execute.
    pub program: PathBuf,
    /// Ordered argument list, passed without shell interpretation.
    pub args: Vec<String>,
    /// Extra environment variables layered over the process environment.
    pub env_overlay: Vec<(String, String)>,
    /// Bytes fed to the child's stdin; stdin is closed when absent.
    pub stdin: Option<Vec<u8>>,
    /// Budget after which the child is killed.
    pub timeout: Duration,
}

/// Normalized result of one invocation. Produced once, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// No vault binary was resolved; no process was started.
    BinaryMissing,
    /// The process ran to completion, timed out, or failed to launch.
    /// Timeouts and launch failures synthesize exit code -1 with the cause
    /// in `stderr`.
    Completed {
        /// Process exit code.
        exit_code: i32,
        /// Captured standard output, lossily decoded as UTF-8.
        stdout: String,
        /// Captured standard error, lossily decoded as UTF-8.
        stderr: String,
    },
}

impl CommandOutcome {
    /// Returns `true` for a zero exit code.
    pub fn succeeded(&self) -> bool {
        matches!(self, CommandOutcome::Completed { exit_code: 0, .. })
    }

    pub(crate) fn launch_failure(message: String) -> Self {
        CommandOutcome::Completed {
            exit_code: -1,
            stdout: String::new(),
            stderr: message,
        }
    }

    pub(crate) fn timed_out() -> Self {
        CommandOutcome::Completed {
            exit_code: -1,
            stdout: String::new(),
            stderr: TIMED_OUT_STDERR.to_owned(),
        }
    }
}

/// Executes a command and captures its output.
///
/// Never blocks past the request timeout and never panics on subprocess
/// faults: spawn errors, kill errors, and timeouts all normalize into a
/// [`CommandOutcome::Completed`] failure. Stdout and stderr are drained on
/// background threads so a chatty child cannot deadlock on a full pipe while
/// the parent polls for exit.
pub fn run(request: CommandRequest) -> CommandOutcome {
    let mut command = Command::new(&request.program);
    command
        .args(&request.args)
        .stdin(if request.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in &request.env_overlay {
        command.env(key, value);
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(error) => return CommandOutcome::launch_failure(error.to_string()),
    };

    if let Some(bytes) = request.stdin {
        if let Some(mut sink) = child.stdin.take() {
            // Writer thread: a child that never reads stdin must not stall us.
            thread::spawn(move || {
                let _ = sink.write_all(&bytes);
            });
        }
    }

    let stdout_drain = drain(child.stdout.take());
    let stderr_drain = drain(child.stderr.take());

    let deadline = Instant::now() + request.timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                return CommandOutcome::Completed {
                    exit_code: status.code().unwrap_or(-1),
                    stdout: join_drain(stdout_drain),
                    stderr: join_drain(stderr_drain),
                };
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    kill_and_reap(&mut child);
                    let _ = join_drain(stdout_drain);
                    let _ = join_drain(stderr_drain);
                    return CommandOutcome::timed_out();
                }
                thread::sleep(WAIT_POLL_INTERVAL);
            }
            Err(error) => {
                kill_and_reap(&mut child);
                let _ = join_drain(stdout_drain);
                let _ = join_drain(stderr_drain);
                return CommandOutcome::launch_failure(error.to_string());
            }
        }
    }
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R>(reader: Option<R>) -> thread::JoinHandle<String>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut bytes = Vec::new();
        if let Some(mut reader) = reader {
            let _ = reader.read_to_end(&mut bytes);
        }
        String::from_utf8_lossy(&bytes).into_owned()
    })
}

fn join_drain(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

#[cfg(all(test, unix))]
mod unit_tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, Instant};

    use super::{run, CommandOutcome, CommandRequest, TIMED_OUT_STDERR};

    fn write_script(path: &Path, body: &str) {
        fs::write(path, body).unwrap();
        let mut permissions = fs::metadata(path).unwrap().permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(path, permissions).unwrap();
    }

    fn request(program: PathBuf) -> CommandRequest {
        CommandRequest {
            program,
            args: Vec::new(),
            env_overlay: Vec::new(),
            stdin: None,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn captures_stdout_stderr_and_exit_code() {
        let temp_dir = tempfile::tempdir().unwrap();
        let script = temp_dir.path().join("tool");
        write_script(
            &script,
            "#!/usr/bin/env bash\necho out-line\necho err-line >&2\nexit 3\n",
        );

        let outcome = run(request(script));
        assert_eq!(
            outcome,
            CommandOutcome::Completed {
                exit_code: 3,
                stdout: "out-line\n".to_owned(),
                stderr: "err-line\n".to_owned(),
            }
        );
        assert!(!outcome.succeeded());
    }

    #[test]
    fn overlay_wins_over_inherited_environment() {
        let temp_dir = tempfile::tempdir().unwrap();
        let script = temp_dir.path().join("tool");
        write_script(&script, "#!/usr/bin/env bash\necho \"${PROBE_VAR:-unset}\"\n");

        std::env::set_var("PROBE_VAR", "inherited");
        let mut req = request(script);
        req.env_overlay = vec![("PROBE_VAR".to_owned(), "overlaid".to_owned())];
        let outcome = run(req);
        std::env::remove_var("PROBE_VAR");

        assert_eq!(
            outcome,
            CommandOutcome::Completed {
                exit_code: 0,
                stdout: "overlaid\n".to_owned(),
                stderr: String::new(),
            }
        );
    }

    #[test]
    fn feeds_stdin_payload() {
        let temp_dir = tempfile::tempdir().unwrap();
        let script = temp_dir.path().join("tool");
        write_script(&script, "#!/usr/bin/env bash\ncat\n");

        let mut req = request(script);
        req.stdin = Some(b"piped secret".to_vec());
        let outcome = run(req);

        assert_eq!(
            outcome,
            CommandOutcome::Completed {
                exit_code: 0,
                stdout: "piped secret".to_owned(),
                stderr: String::new(),
            }
        );
    }

    #[test]
    fn kills_child_on_timeout() {
        let temp_dir = tempfile::tempdir().unwrap();
        let script = temp_dir.path().join("tool");
        write_script(&script, "#!/usr/bin/env bash\nsleep 30\n");

        let mut req = request(script);
        req.timeout = Duration::from_millis(200);
        let started = Instant::now();
        let outcome = run(req);

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(
            outcome,
            CommandOutcome::Completed {
                exit_code: -1,
                stdout: String::new(),
                stderr: TIMED_OUT_STDERR.to_owned(),
            }
        );
    }

    #[test]
    fn launch_failure_becomes_outcome() {
        let outcome = run(request(PathBuf::from("/nonexistent/bwbridge-test-tool")));
        match outcome {
            CommandOutcome::Completed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, -1);
                assert!(!stderr.is_empty());
            }
            CommandOutcome::BinaryMissing => panic!("launch failure must complete"),
        }
    }
}
