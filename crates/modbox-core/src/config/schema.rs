//! 按领域分组的配置结构体
//!
//! 从环境变量加载，统一 fallback 逻辑。

use super::env_keys::{observability as obv_keys, tool};
use super::loader::{env_bool, env_optional, env_or};
use std::path::PathBuf;

/// 构建工具配置
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Build tool binary (`go` unless overridden).
    pub go_bin: String,
    /// Parent directory for sandbox roots; `None` means the system temp dir.
    pub temp_root: Option<PathBuf>,
}

impl ToolConfig {
    pub fn from_env() -> Self {
        Self {
            go_bin: env_or(tool::MODBOX_GO_BIN, tool::GO_BIN_ALIASES, || {
                "go".to_string()
            }),
            temp_root: env_optional(tool::MODBOX_TMPDIR, &[]).map(PathBuf::from),
        }
    }

    /// Directory sandbox roots are created in.
    pub fn temp_root_or_default(&self) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            go_bin: "go".to_string(),
            temp_root: None,
        }
    }
}

/// 可观测性配置：quiet、log_level、log_json
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| Self {
            quiet: env_bool(obv_keys::MODBOX_QUIET, &[], false),
            log_level: env_or(obv_keys::MODBOX_LOG_LEVEL, &[], || {
                "modbox=info".to_string()
            }),
            log_json: env_bool(obv_keys::MODBOX_LOG_JSON, &[], false),
        })
    }
}
