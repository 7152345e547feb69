//! Build the Go environment for a sandbox.

use modbox_core::config::env_keys::go_env;
use std::path::Path;

/// A single `NAME=value` assignment.
pub type EnvVar = (String, String);

/// Assemble the variables every command in a sandbox runs with.
///
/// Order is significant: the defaults come first and `overrides` are appended
/// last, so an override with the same name as a default wins when the list is
/// applied in order.
pub fn build_go_env(gopath: &Path, goproxy: &str, overrides: &[EnvVar]) -> Vec<EnvVar> {
    let mut env = Vec::with_capacity(4 + overrides.len());
    env.push((
        go_env::GOPATH.to_string(),
        gopath.to_string_lossy().to_string(),
    ));
    env.push((go_env::GOPROXY.to_string(), goproxy.to_string()));
    // Empty rather than absent so the host's setting is not inherited.
    env.push((go_env::GO111MODULE.to_string(), String::new()));
    // Proxy fixtures have no checksum database entries.
    env.push((go_env::GOSUMDB.to_string(), "off".to_string()));
    env.extend(overrides.iter().cloned());
    env
}

/// Value a variable ends up with when `env` is applied in order.
pub fn resolve<'a>(env: &'a [EnvVar], name: &str) -> Option<&'a str> {
    env.iter()
        .rev()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// Parse a `NAME=value` string. The value may itself contain `=`.
pub fn parse_assignment(s: &str) -> Option<EnvVar> {
    let (name, value) = s.split_once('=')?;
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.to_string()))
}

/// Render assignments as `NAME=value` lines.
pub fn format_env(env: &[EnvVar]) -> Vec<String> {
    env.iter().map(|(k, v)| format!("{}={}", k, v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn var(k: &str, v: &str) -> EnvVar {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_defaults_in_order() {
        let env = build_go_env(&PathBuf::from("/sb/cache"), "file:///sb/proxy", &[]);
        assert_eq!(
            env,
            vec![
                var("GOPATH", "/sb/cache"),
                var("GOPROXY", "file:///sb/proxy"),
                var("GO111MODULE", ""),
                var("GOSUMDB", "off"),
            ]
        );
    }

    #[test]
    fn test_overrides_appended_and_take_priority() {
        let overrides = vec![var("GO111MODULE", "on"), var("GOFLAGS", "-mod=mod")];
        let env = build_go_env(&PathBuf::from("/sb/cache"), "file:///sb/proxy", &overrides);
        assert_eq!(env.len(), 6);
        assert_eq!(&env[4..], overrides.as_slice());
        assert_eq!(resolve(&env, "GO111MODULE"), Some("on"));
        assert_eq!(resolve(&env, "GOFLAGS"), Some("-mod=mod"));
        assert_eq!(resolve(&env, "GOSUMDB"), Some("off"));
        assert_eq!(resolve(&env, "HOME"), None);
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("GOFLAGS=-mod=mod"), Some(var("GOFLAGS", "-mod=mod")));
        assert_eq!(parse_assignment("EMPTY="), Some(var("EMPTY", "")));
        assert_eq!(parse_assignment("=x"), None);
        assert_eq!(parse_assignment("novalue"), None);
    }

    #[test]
    fn test_format_env() {
        assert_eq!(
            format_env(&[var("GOSUMDB", "off"), var("GO111MODULE", "")]),
            vec!["GOSUMDB=off".to_string(), "GO111MODULE=".to_string()]
        );
    }
}
