//! 统一环境变量加载逻辑
//!
//! 集中维护 fallback 链，避免在业务代码中重复 `or_else` 调用。

use std::env;

/// 从主变量或别名链读取环境变量，失败时使用默认值
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default)
}

/// 从主变量或别名链读取，返回 Option（空值视为未设置）
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
        .and_then(|s| {
            let s = s.trim().to_string();
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        })
}

/// 解析布尔型环境变量：0/false/no/off 为 false，其余非空值为 true
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    let v = env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()));
    match v.as_deref() {
        Some(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable names; the process environment is shared
    // across test threads.

    #[test]
    fn test_env_or_falls_back_to_alias_then_default() {
        assert_eq!(
            env_or("MODBOX_TEST_UNSET_PRIMARY", &["MODBOX_TEST_UNSET_ALIAS"], || {
                "fallback".to_string()
            }),
            "fallback"
        );
        assert_eq!(
            env_or("MODBOX_TEST_UNSET_PRIMARY", &["PATH"], String::new),
            env::var("PATH").unwrap()
        );
    }

    #[test]
    fn test_env_optional_unset_is_none() {
        assert!(env_optional("MODBOX_TEST_OPTIONAL_UNSET", &[]).is_none());
    }

    #[test]
    fn test_env_bool_default_when_unset() {
        assert!(env_bool("MODBOX_TEST_BOOL_UNSET", &[], true));
        assert!(!env_bool("MODBOX_TEST_BOOL_UNSET", &[], false));
    }
}
