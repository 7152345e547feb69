//! `modbox env`: show the variables a sandbox hands to the build tool.

use anyhow::{Context, Result};
use modbox_sandbox::env::builder::format_env;
use modbox_sandbox::Sandbox;

use crate::cli::SandboxArgs;

/// `modbox env --src ... [--proxy ...] [--env K=V]...`
///
/// Entries are printed in application order, so a later line with the same
/// name is the one that takes effect.
pub fn cmd_env(args: &SandboxArgs) -> Result<()> {
    let config = super::load_config(args)?;
    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    rt.block_on(async {
        let sandbox = Sandbox::new(config).await.context("creating sandbox")?;
        for line in format_env(&sandbox.go_env()) {
            println!("{}", line);
        }
        sandbox.close().await.context("closing sandbox")?;
        Ok(())
    })
}
