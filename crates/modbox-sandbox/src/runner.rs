use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use modbox_core::config::ToolConfig;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::env::builder::EnvVar;
use crate::error::CommandError;

/// One command to run: `<program> <verb> <args...>` in `working_dir`.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub verb: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Applied in order on top of the inherited environment; a later entry
    /// with the same name replaces an earlier one.
    pub env: Vec<EnvVar>,
}

/// Captured output streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Outcome of a run: whatever was captured, plus success or the failure.
///
/// Output is kept next to the result so callers can inspect stderr of a
/// failed command too.
#[derive(Debug)]
pub struct RawRun {
    pub output: RawOutput,
    pub result: Result<(), CommandError>,
}

/// Executes build-tool invocations for a sandbox.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `inv`, abandoning and killing the process if `cancel` fires.
    async fn run_raw(&self, inv: &Invocation, cancel: &CancellationToken) -> RawRun;
}

/// Runs invocations against a real `go` binary.
#[derive(Debug, Clone)]
pub struct GoCommandRunner {
    program: PathBuf,
}

impl GoCommandRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolve the configured binary on PATH, keeping the raw name if lookup
    /// fails so the spawn error names what was asked for.
    pub fn from_config(cfg: &ToolConfig) -> Self {
        let program = which::which(&cfg.go_bin).unwrap_or_else(|e| {
            tracing::debug!(go_bin = %cfg.go_bin, error = %e, "build tool not found on PATH");
            PathBuf::from(&cfg.go_bin)
        });
        Self::new(program)
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }
}

#[async_trait]
impl CommandRunner for GoCommandRunner {
    async fn run_raw(&self, inv: &Invocation, cancel: &CancellationToken) -> RawRun {
        let program = self.program_name();
        if cancel.is_cancelled() {
            return RawRun {
                output: RawOutput::default(),
                result: Err(CommandError::Cancelled {
                    program,
                    verb: inv.verb.clone(),
                }),
            };
        }

        let mut cmd = Command::new(&self.program);
        cmd.arg(&inv.verb)
            .args(&inv.args)
            .current_dir(&inv.working_dir)
            .envs(inv.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            program = %program,
            verb = %inv.verb,
            args = ?inv.args,
            dir = %inv.working_dir.display(),
            "spawning command"
        );

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                return RawRun {
                    output: RawOutput::default(),
                    result: Err(CommandError::Spawn {
                        program,
                        verb: inv.verb.clone(),
                        source,
                    }),
                };
            }
        };

        // Dropping the wait future drops the child, which kills it.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(verb = %inv.verb, "command cancelled");
                RawRun {
                    output: RawOutput::default(),
                    result: Err(CommandError::Cancelled {
                        program,
                        verb: inv.verb.clone(),
                    }),
                }
            }
            res = child.wait_with_output() => match res {
                Ok(out) => {
                    let result = if out.status.success() {
                        Ok(())
                    } else {
                        Err(CommandError::Exit {
                            program,
                            verb: inv.verb.clone(),
                            code: out.status.code(),
                            stderr: String::from_utf8_lossy(&out.stderr).trim_end().to_string(),
                        })
                    };
                    RawRun {
                        output: RawOutput {
                            stdout: out.stdout,
                            stderr: out.stderr,
                        },
                        result,
                    }
                }
                Err(source) => RawRun {
                    output: RawOutput::default(),
                    result: Err(CommandError::Wait {
                        program,
                        verb: inv.verb.clone(),
                        source,
                    }),
                },
            },
        }
    }
}
