use clap::{Args, Parser, Subcommand};

/// modbox - disposable sandboxes for Go commands against synthetic modules
#[derive(Parser, Debug)]
#[command(name = "modbox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Fixture inputs shared by commands that build a sandbox.
#[derive(Args, Debug, Clone)]
pub struct SandboxArgs {
    /// txtar file with the working directory contents
    #[arg(long, value_name = "TXTAR")]
    pub src: String,

    /// txtar file with module proxy contents (`module@version/path` names)
    #[arg(long, value_name = "TXTAR")]
    pub proxy: Option<String>,

    /// Extra environment variable for the build tool (repeatable, overrides defaults)
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Sandbox name, embedded in the temporary directory name
    #[arg(long, default_value = "cli")]
    pub name: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a sandbox, run `go <VERB> [ARGS...]` in it, then tear it down
    Run {
        #[command(flatten)]
        sandbox: SandboxArgs,

        /// Build tool verb (e.g. `list`, `mod`, `get`)
        #[arg(value_name = "VERB")]
        verb: String,

        /// Arguments passed after the verb
        #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Print the environment commands in a sandbox would run with
    Env {
        #[command(flatten)]
        sandbox: SandboxArgs,
    },

    /// Split a proxy fixture path into module path, version and file suffix
    Split {
        /// Path such as `example.com@v1.2.3/blah/blah.go`
        #[arg(value_name = "PATH")]
        path: String,
    },
}
