//! CLI commands.
//!
//!   run   : build a sandbox, run one build-tool command, tear down
//!   env   : print the effective build-tool environment of a sandbox
//!   split : decompose a proxy fixture path

pub mod env;
pub mod run;
pub mod split;

use anyhow::{Context, Result};
use modbox_sandbox::env::builder::{parse_assignment, EnvVar};
use modbox_sandbox::SandboxConfig;
use std::fs;

use crate::cli::SandboxArgs;

/// Read fixture files and overrides into a sandbox configuration.
pub(crate) fn load_config(args: &SandboxArgs) -> Result<SandboxConfig> {
    let files = fs::read_to_string(&args.src)
        .with_context(|| format!("reading source fixture {}", args.src))?;
    let proxy_files = match &args.proxy {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading proxy fixture {}", path))?,
        None => String::new(),
    };
    let env = parse_overrides(&args.env)?;
    Ok(SandboxConfig::new(&args.name, files, proxy_files).with_env(env))
}

fn parse_overrides(raw: &[String]) -> Result<Vec<EnvVar>> {
    raw.iter()
        .map(|s| {
            parse_assignment(s)
                .with_context(|| format!("invalid --env value {:?}: expected KEY=VALUE", s))
        })
        .collect()
}
