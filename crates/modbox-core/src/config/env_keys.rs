//! 环境变量 key 常量与别名定义
//!
//! 主变量使用 `MODBOX_*`。

/// 构建工具与临时目录
pub mod tool {
    /// Build tool binary; resolved against PATH when not absolute.
    pub const MODBOX_GO_BIN: &str = "MODBOX_GO_BIN";
    pub const GO_BIN_ALIASES: &[&str] = &["GO_BIN"];

    /// Parent directory for sandbox roots. Defaults to the system temp dir.
    pub const MODBOX_TMPDIR: &str = "MODBOX_TMPDIR";
}

/// 可观测性与日志
pub mod observability {
    pub const MODBOX_QUIET: &str = "MODBOX_QUIET";

    pub const MODBOX_LOG_LEVEL: &str = "MODBOX_LOG_LEVEL";

    pub const MODBOX_LOG_JSON: &str = "MODBOX_LOG_JSON";
}

/// Variables injected into every command run inside a sandbox.
pub mod go_env {
    pub const GOPATH: &str = "GOPATH";
    pub const GOPROXY: &str = "GOPROXY";
    pub const GO111MODULE: &str = "GO111MODULE";
    pub const GOSUMDB: &str = "GOSUMDB";
}
