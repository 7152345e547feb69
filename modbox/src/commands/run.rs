//! `modbox run`: one build-tool command in a throwaway sandbox.
//!
//! Captured stdout and stderr are forwarded to the matching streams. File
//! events raised by the command are printed to stdout as JSON lines
//! (`{"event": ...}`) before the command's own output. Output is forwarded
//! whether or not the command succeeded.

use anyhow::{Context, Result};
use modbox_sandbox::{FileEvent, RawOutput, Sandbox, SandboxConfig};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::cli::SandboxArgs;

/// `modbox run --src ... <verb> [args...]`
pub fn cmd_run(args: &SandboxArgs, verb: &str, verb_args: &[String]) -> Result<()> {
    let config = super::load_config(args)?;
    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    rt.block_on(run_in_sandbox(config, verb, verb_args))
}

async fn run_in_sandbox(config: SandboxConfig, verb: &str, verb_args: &[String]) -> Result<()> {
    let sandbox = Sandbox::new(config).await.context("creating sandbox")?;

    let events: Arc<Mutex<Vec<FileEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    sandbox.workdir().add_watcher(move |batch: &[FileEvent]| {
        if let Ok(mut seen) = sink.lock() {
            seen.extend_from_slice(batch);
        }
    });

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; cancelling command");
            interrupt.cancel();
        }
    });

    let run = sandbox.run_go_command_raw(&cancel, verb, verb_args).await;
    ctrl_c.abort();

    let seen = events.lock().map(|e| e.clone()).unwrap_or_default();
    let outcome = forward(&mut io::stdout().lock(), &mut io::stderr(), &seen, &run.output)
        .and(run.result.with_context(|| format!("go {}", verb)));

    let closed = sandbox.close().await;
    match (outcome, closed) {
        (Err(e), Err(close_err)) => {
            tracing::warn!(error = %close_err, "sandbox teardown failed");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), closed) => closed.context("closing sandbox"),
    }
}

/// Print events, then the command's own streams. Runs for failed commands
/// too, so their stdout is not lost.
fn forward(
    out: &mut impl Write,
    err: &mut impl Write,
    events: &[FileEvent],
    output: &RawOutput,
) -> Result<()> {
    for event in events {
        let line = serde_json::json!({ "event": event });
        writeln!(out, "{}", line)?;
    }
    out.write_all(&output.stdout)?;
    out.flush()?;
    err.write_all(&output.stderr)?;
    Ok(())
}
