//! Sandbox orchestration: allocate, populate, run, tear down.

use std::path::Path;
use std::sync::Arc;

use modbox_core::config::ToolConfig;
use tokio_util::sync::CancellationToken;

use crate::env::builder::{build_go_env, EnvVar};
use crate::error::SandboxError;
use crate::info_log;
use crate::proxy::Proxy;
use crate::runner::{CommandRunner, GoCommandRunner, Invocation, RawOutput, RawRun};
use crate::watch_policy;
use crate::workdir::Workdir;
use crate::workspace::WorkspaceDirs;

/// Inputs for [`Sandbox::new`].
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Human-readable name, embedded in the root directory name.
    pub name: String,
    /// txtar fixture for the working directory.
    pub files: String,
    /// txtar fixture for the module proxy.
    pub proxy_files: String,
    /// Extra variables applied after the defaults; same-named entries win.
    pub env: Vec<EnvVar>,
    pub tool: ToolConfig,
}

impl SandboxConfig {
    pub fn new(name: impl Into<String>, files: impl Into<String>, proxy_files: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: files.into(),
            proxy_files: proxy_files.into(),
            env: Vec::new(),
            tool: ToolConfig::from_env(),
        }
    }

    pub fn with_env(mut self, env: Vec<EnvVar>) -> Self {
        self.env = env;
        self
    }

    pub fn with_tool(mut self, tool: ToolConfig) -> Self {
        self.tool = tool;
        self
    }
}

/// Temporary resources for running Go commands against fixture code.
///
/// One command at a time: callers that need parallelism create one sandbox
/// per task. [`Sandbox::close`] consumes the sandbox and removes its tree.
pub struct Sandbox {
    name: String,
    dirs: WorkspaceDirs,
    env: Vec<EnvVar>,
    proxy: Proxy,
    workdir: Workdir,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sandbox")
            .field("name", &self.name)
            .field("root", &self.dirs.root())
            .field("env", &self.env)
            .finish()
    }
}

impl Sandbox {
    /// Create a sandbox that runs commands with the configured `go` binary.
    pub async fn new(config: SandboxConfig) -> Result<Self, SandboxError> {
        let runner = Arc::new(GoCommandRunner::from_config(&config.tool));
        Self::with_runner(config, runner).await
    }

    /// Create a sandbox whose commands go through `runner`.
    ///
    /// If populating the proxy or workdir fails, everything allocated so far
    /// is torn down before the error is returned.
    pub async fn with_runner(
        config: SandboxConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, SandboxError> {
        let SandboxConfig {
            name,
            files,
            proxy_files,
            env,
            tool,
        } = config;

        let dirs = WorkspaceDirs::allocate(&tool.temp_root_or_default(), &name)?;

        let proxy = match Proxy::new(&dirs.proxy, &proxy_files) {
            Ok(proxy) => proxy,
            Err(e) => {
                return Err(abort(&name, dirs, &env, runner.as_ref(), SandboxError::Proxy(e)).await)
            }
        };
        let workdir = match Workdir::new(&dirs.work, &files) {
            Ok(workdir) => workdir,
            Err(e) => {
                return Err(abort(&name, dirs, &env, runner.as_ref(), SandboxError::Workdir(e)).await)
            }
        };

        info_log!(sandbox = %name, root = %dirs.root().display(), "sandbox ready");
        Ok(Self {
            name,
            dirs,
            env,
            proxy,
            workdir,
            runner,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        self.dirs.root()
    }

    /// The module cache directory, used as GOPATH.
    pub fn gopath(&self) -> &Path {
        &self.dirs.gopath
    }

    pub fn proxy(&self) -> &Proxy {
        &self.proxy
    }

    pub fn workdir(&self) -> &Workdir {
        &self.workdir
    }

    /// Variables for commands run in this sandbox, recomputed on each call.
    pub fn go_env(&self) -> Vec<EnvVar> {
        build_go_env(&self.dirs.gopath, self.proxy.goproxy(), &self.env)
    }

    /// Run `go <verb> <args...>` in the working directory.
    ///
    /// On success, a `go.mod` creation reported on stderr is forwarded to the
    /// workdir's watchers as a Created event.
    pub async fn run_go_command<S: AsRef<str>>(
        &self,
        cancel: &CancellationToken,
        verb: &str,
        args: &[S],
    ) -> Result<RawOutput, SandboxError> {
        let run = self.run_go_command_raw(cancel, verb, args).await;
        run.result?;
        Ok(run.output)
    }

    /// Like [`Sandbox::run_go_command`], but keeps whatever the command wrote
    /// even when it fails.
    pub async fn run_go_command_raw<S: AsRef<str>>(
        &self,
        cancel: &CancellationToken,
        verb: &str,
        args: &[S],
    ) -> RawRun {
        let inv = self.invocation(verb, args);
        tracing::debug!(sandbox = %self.name, verb = %verb, args = ?inv.args, "running go command");
        let run = self.runner.run_raw(&inv, cancel).await;
        if run.result.is_ok() {
            let stderr = String::from_utf8_lossy(&run.output.stderr);
            if let Some(event) = watch_policy::synthesized_event(verb, &stderr, self.workdir.root()) {
                self.workdir.send_events(&[event]);
            }
        }
        run
    }

    /// Clean the module cache, then remove the whole tree.
    ///
    /// Removal is attempted even if cleaning fails; both failures are
    /// reported together.
    pub async fn close(self) -> Result<(), SandboxError> {
        let clean = self.invocation("clean", &["-modcache"]);
        let Sandbox {
            name, dirs, runner, ..
        } = self;
        let result = teardown(runner.as_ref(), &clean, dirs).await;
        match &result {
            Ok(()) => info_log!(sandbox = %name, "sandbox closed"),
            Err(e) => tracing::warn!(sandbox = %name, error = %e, "sandbox teardown failed"),
        }
        result
    }

    fn invocation<S: AsRef<str>>(&self, verb: &str, args: &[S]) -> Invocation {
        Invocation {
            verb: verb.to_string(),
            args: args.iter().map(|a| a.as_ref().to_string()).collect(),
            working_dir: self.workdir.root().to_path_buf(),
            env: self.go_env(),
        }
    }
}

fn clean_invocation(working_dir: &Path, env: Vec<EnvVar>) -> Invocation {
    Invocation {
        verb: "clean".to_string(),
        args: vec!["-modcache".to_string()],
        working_dir: working_dir.to_path_buf(),
        env,
    }
}

/// Tear down a sandbox whose construction failed part way, returning `err`.
async fn abort(
    name: &str,
    dirs: WorkspaceDirs,
    overrides: &[EnvVar],
    runner: &dyn CommandRunner,
    err: SandboxError,
) -> SandboxError {
    tracing::warn!(sandbox = %name, error = %err, "sandbox construction failed; tearing down");
    let env = build_go_env(&dirs.gopath, &Proxy::url_for(&dirs.proxy), overrides);
    let clean = clean_invocation(&dirs.work, env);
    if let Err(teardown_err) = teardown(runner, &clean, dirs).await {
        tracing::warn!(sandbox = %name, error = %teardown_err, "teardown after failed construction");
    }
    err
}

async fn teardown(
    runner: &dyn CommandRunner,
    clean: &Invocation,
    dirs: WorkspaceDirs,
) -> Result<(), SandboxError> {
    // Module cache files are read-only; plain recursive removal fails on them.
    let clean_err = runner
        .run_raw(clean, &CancellationToken::new())
        .await
        .result
        .err();
    let root = dirs.root().to_path_buf();
    let remove_err = dirs.remove().err();
    tracing::debug!(
        root = %root.display(),
        clean_ok = clean_err.is_none(),
        remove_ok = remove_err.is_none(),
        "teardown finished"
    );
    if clean_err.is_none() && remove_err.is_none() {
        return Ok(());
    }
    Err(SandboxError::Teardown {
        clean: clean_err,
        remove: remove_err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::builder::resolve;
    use crate::error::CommandError;
    use crate::workdir::{FileChangeType, FileEvent};
    use async_trait::async_trait;
    use std::sync::Mutex;

    const SRC: &str = "\
-- go.mod --
module mod.com

go 1.12
-- main.go --
package main
";

    const PROXY: &str = "\
-- example.com@v1.2.3/go.mod --
module example.com
-- example.com@v1.2.3/blah/blah.go --
package blah
";

    /// Records invocations and answers with scripted stderr.
    #[derive(Default)]
    struct FakeRunner {
        stderr: String,
        fail_verbs: Vec<&'static str>,
        calls: Mutex<Vec<Invocation>>,
    }

    impl FakeRunner {
        fn verbs(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| format!("{} {}", c.verb, c.args.join(" ")).trim().to_string())
                .collect()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run_raw(&self, inv: &Invocation, _cancel: &CancellationToken) -> RawRun {
            self.calls.lock().unwrap().push(inv.clone());
            let output = RawOutput {
                stdout: Vec::new(),
                stderr: self.stderr.clone().into_bytes(),
            };
            let result = if self.fail_verbs.contains(&inv.verb.as_str()) {
                Err(CommandError::Exit {
                    program: "go".to_string(),
                    verb: inv.verb.clone(),
                    code: Some(1),
                    stderr: self.stderr.clone(),
                })
            } else {
                Ok(())
            };
            RawRun { output, result }
        }
    }

    fn config(tmp: &Path, files: &str) -> SandboxConfig {
        SandboxConfig::new("test", files, PROXY).with_tool(ToolConfig {
            go_bin: "go".to_string(),
            temp_root: Some(tmp.to_path_buf()),
        })
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    fn record_events(sb: &Sandbox) -> Arc<Mutex<Vec<FileEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        sb.workdir()
            .add_watcher(move |events: &[FileEvent]| sink.lock().unwrap().extend_from_slice(events));
        seen
    }

    #[tokio::test]
    async fn test_new_populates_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::default());
        let sb = Sandbox::with_runner(config(tmp.path(), SRC), runner.clone())
            .await
            .unwrap();

        assert_eq!(entries(sb.root()), 3);
        assert_eq!(sb.workdir().read_file("main.go").unwrap(), "package main\n");
        assert!(sb
            .proxy()
            .dir()
            .join("example.com")
            .join("@v")
            .join("v1.2.3.zip")
            .is_file());
        assert!(sb.gopath().is_dir());
        assert!(runner.verbs().is_empty());

        sb.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_leaves_no_residue() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::default());
        let sb = Sandbox::with_runner(config(tmp.path(), SRC), runner.clone())
            .await
            .unwrap();
        let root = sb.root().to_path_buf();

        sb.close().await.unwrap();

        assert!(!root.exists());
        assert_eq!(entries(tmp.path()), 0);
        assert_eq!(runner.verbs(), vec!["clean -modcache".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_workdir_tears_down() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::default());
        let err = Sandbox::with_runner(config(tmp.path(), "-- ../escape.go --\nx\n"), runner.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, SandboxError::Workdir(_)));
        assert_eq!(entries(tmp.path()), 0);
        assert_eq!(runner.verbs(), vec!["clean -modcache".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_proxy_tears_down() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::default());
        let mut cfg = config(tmp.path(), SRC);
        cfg.proxy_files = "-- ../evil@v1.0.0/a.go --\npackage a\n".to_string();
        let err = Sandbox::with_runner(cfg, runner.clone()).await.unwrap_err();

        assert!(matches!(err, SandboxError::Proxy(_)));
        assert_eq!(entries(tmp.path()), 0);
    }

    #[tokio::test]
    async fn test_allocation_failure_runs_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::default());
        let cfg = config(&tmp.path().join("missing"), SRC);
        let err = Sandbox::with_runner(cfg, runner.clone()).await.unwrap_err();

        assert!(matches!(err, SandboxError::CreateRoot(_)));
        assert!(runner.verbs().is_empty());
    }

    #[tokio::test]
    async fn test_go_env_points_inside_sandbox() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::default());
        let cfg = config(tmp.path(), SRC).with_env(vec![
            ("GOSUMDB".to_string(), "sum.golang.org".to_string()),
            ("GOFLAGS".to_string(), "-mod=mod".to_string()),
        ]);
        let sb = Sandbox::with_runner(cfg, runner).await.unwrap();

        let env = sb.go_env();
        let gopath = sb.gopath().to_string_lossy().to_string();
        assert_eq!(resolve(&env, "GOPATH"), Some(gopath.as_str()));
        assert_eq!(resolve(&env, "GOPROXY"), Some(sb.proxy().goproxy()));
        assert_eq!(resolve(&env, "GO111MODULE"), Some(""));
        assert_eq!(resolve(&env, "GOSUMDB"), Some("sum.golang.org"));
        assert_eq!(resolve(&env, "GOFLAGS"), Some("-mod=mod"));
        assert_eq!(env, sb.go_env());

        sb.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_run_passes_workdir_and_env() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::default());
        let sb = Sandbox::with_runner(config(tmp.path(), SRC), runner.clone())
            .await
            .unwrap();

        sb.run_go_command(&CancellationToken::new(), "list", &["./..."])
            .await
            .unwrap();

        {
            let calls = runner.calls.lock().unwrap();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].verb, "list");
            assert_eq!(calls[0].args, vec!["./...".to_string()]);
            assert_eq!(calls[0].working_dir, sb.workdir().root());
            assert_eq!(calls[0].env, sb.go_env());
        }
        sb.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_mod_init_marker_sends_one_event() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner {
            stderr: "go: creating new go.mod: module mod.com\n".to_string(),
            ..Default::default()
        });
        let sb = Sandbox::with_runner(config(tmp.path(), ""), runner)
            .await
            .unwrap();
        let seen = record_events(&sb);

        sb.run_go_command(&CancellationToken::new(), "mod", &["init", "mod.com"])
            .await
            .unwrap();

        {
            let events = seen.lock().unwrap();
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].path, sb.workdir().root().join("go.mod"));
            assert_eq!(events[0].protocol_event.kind, FileChangeType::Created);
            assert_eq!(events[0].protocol_event.uri, sb.workdir().uri_for("go.mod").unwrap());
        }
        sb.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_other_stderr_sends_no_event() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner {
            stderr: "go: downloading example.com v1.2.3\n".to_string(),
            ..Default::default()
        });
        let sb = Sandbox::with_runner(config(tmp.path(), SRC), runner)
            .await
            .unwrap();
        let seen = record_events(&sb);

        sb.run_go_command(&CancellationToken::new(), "get", &["example.com@v1.2.3"])
            .await
            .unwrap();

        assert!(seen.lock().unwrap().is_empty());
        sb.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_command_sends_no_event() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner {
            stderr: "go: creating new go.mod: module mod.com\n".to_string(),
            fail_verbs: vec!["mod"],
            ..Default::default()
        });
        let sb = Sandbox::with_runner(config(tmp.path(), ""), runner)
            .await
            .unwrap();
        let seen = record_events(&sb);

        let err = sb
            .run_go_command(&CancellationToken::new(), "mod", &["init", "mod.com"])
            .await
            .unwrap_err();

        assert!(matches!(err, SandboxError::Command(CommandError::Exit { .. })));
        assert!(seen.lock().unwrap().is_empty());
        sb.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_raw_run_keeps_output_of_failed_command() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner {
            stderr: "go: creating new go.mod: module mod.com\n".to_string(),
            fail_verbs: vec!["mod"],
            ..Default::default()
        });
        let sb = Sandbox::with_runner(config(tmp.path(), ""), runner)
            .await
            .unwrap();
        let seen = record_events(&sb);

        let run = sb
            .run_go_command_raw(&CancellationToken::new(), "mod", &["init", "mod.com"])
            .await;

        assert!(matches!(run.result, Err(CommandError::Exit { .. })));
        assert_eq!(run.output.stderr, b"go: creating new go.mod: module mod.com\n");
        assert!(seen.lock().unwrap().is_empty());
        sb.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_removes_tree_when_clean_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner {
            stderr: "go: cannot clean".to_string(),
            fail_verbs: vec!["clean"],
            ..Default::default()
        });
        let sb = Sandbox::with_runner(config(tmp.path(), SRC), runner.clone())
            .await
            .unwrap();
        let root = sb.root().to_path_buf();

        let err = sb.close().await.unwrap_err();

        match err {
            SandboxError::Teardown { clean, remove } => {
                assert!(clean.is_some());
                assert!(remove.is_none());
            }
            other => panic!("expected teardown error, got {:?}", other),
        }
        assert!(!root.exists());
        assert_eq!(runner.verbs(), vec!["clean -modcache".to_string()]);
    }
}
