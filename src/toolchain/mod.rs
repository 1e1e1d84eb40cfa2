//! Toolchain resolution and subprocess invocation.
//!
//! The toolchain configuration is built once at startup and passed explicitly
//! to every component that needs it. Tools are spawned with argument vectors
//! (never a shell-interpreted command line) and their exit code, stdout and
//! stderr are captured separately.

use crate::error::EquivError;
use std::env;
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{ChildStderr, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Name of the required optimizing pipeline tool.
pub const OPT_TOOL: &str = "opt";
/// Name of the optional structural-diff tool.
pub const DIFF_TOOL: &str = "llvm-diff";

/// Interval between liveness checks on a child with a timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Resolved tool locations plus the per-invocation timeout.
#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    opt: PathBuf,
    llvm_diff: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ToolchainConfig {
    /// Resolve the tools under `<base>/bin`, or on `PATH` when no base
    /// directory is given.
    ///
    /// `opt` is required and validated eagerly; `llvm-diff` only feeds the
    /// best-effort diagnostic pass, so its absence is recorded rather than
    /// reported as an error.
    pub fn discover(base: Option<&Path>, timeout: Option<Duration>) -> Result<Self, EquivError> {
        let (opt, llvm_diff) = match base {
            Some(base) => {
                let bin = base.join("bin");
                let opt = bin.join(OPT_TOOL);
                if !opt.is_file() {
                    return Err(EquivError::ToolNotFound(opt.display().to_string()));
                }
                let diff = bin.join(DIFF_TOOL);
                let diff = diff.is_file().then_some(diff);
                (opt, diff)
            }
            None => {
                let opt = find_on_path(OPT_TOOL)
                    .ok_or_else(|| EquivError::ToolNotFound(OPT_TOOL.to_string()))?;
                (opt, find_on_path(DIFF_TOOL))
            }
        };

        Ok(Self {
            opt,
            llvm_diff,
            timeout,
        })
    }

    pub fn opt(&self) -> &Path {
        &self.opt
    }

    pub fn llvm_diff(&self) -> Option<&Path> {
        self.llvm_diff.as_deref()
    }

    /// Run one tool to completion, capturing its streams.
    ///
    /// Returns a record even when the tool exits non-zero; the caller decides
    /// whether that is fatal. Launch failures and timeouts are errors here.
    pub fn run(&self, program: &Path, args: &[OsString]) -> Result<ToolInvocationRecord, EquivError> {
        let command = render_command(program, args);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EquivError::ToolInvocation {
                command: command.clone(),
                message: format!("failed to launch: {}", e),
            })?;

        // Drain both pipes on dedicated threads so a chatty tool cannot
        // deadlock against a full pipe buffer while we wait on it.
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let stdout_reader = thread::spawn(move || read_stdout(stdout_pipe));
        let stderr_reader = thread::spawn(move || read_stderr(stderr_pipe));

        let status = match self.timeout {
            None => child.wait().map_err(|e| EquivError::ToolInvocation {
                command: command.clone(),
                message: format!("failed to wait: {}", e),
            })?,
            Some(limit) => {
                let deadline = Instant::now() + limit;
                loop {
                    let polled = child.try_wait().map_err(|e| EquivError::ToolInvocation {
                        command: command.clone(),
                        message: format!("failed to wait: {}", e),
                    })?;
                    match polled {
                        Some(status) => break status,
                        None if Instant::now() >= deadline => {
                            let _ = child.kill();
                            let _ = child.wait();
                            let _ = stdout_reader.join();
                            let _ = stderr_reader.join();
                            return Err(EquivError::Timeout {
                                command,
                                seconds: limit.as_secs(),
                            });
                        }
                        None => thread::sleep(POLL_INTERVAL),
                    }
                }
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        Ok(ToolInvocationRecord {
            command,
            stdout,
            stderr,
            status: status.code(),
        })
    }
}

/// Outcome of one external tool call.
#[derive(Debug, Clone)]
pub struct ToolInvocationRecord {
    /// Rendered command line, for diagnostics only.
    pub command: String,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit code; `None` when the tool was killed by a signal.
    pub status: Option<i32>,
}

impl ToolInvocationRecord {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Trimmed, lossily-decoded stderr for error messages.
    pub fn stderr_excerpt(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

fn read_stdout(pipe: Option<ChildStdout>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}

fn read_stderr(pipe: Option<ChildStderr>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}

fn render_command(program: &Path, args: &[OsString]) -> String {
    let mut parts = vec![program.display().to_string()];
    parts.extend(args.iter().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
