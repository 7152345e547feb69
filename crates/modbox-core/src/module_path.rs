//! Module path utilities for proxy-style paths.
//!
//! Proxy fixtures name their files `modulePath@version/suffix`; these helpers
//! take such names apart and escape module paths for the on-disk proxy layout.

/// Splits a proxy-style path of the form `modulePath@version/suffix`.
///
/// The module path is every segment up to and including the first segment
/// containing `@`; that segment is cut at its first `@`, the rest of it is the
/// version, and the remaining segments form the suffix. A path with no `@` is
/// just a module path and comes back unchanged with empty version and suffix.
///
/// ```
/// use modbox_core::module_path::split_module_version_path;
///
/// assert_eq!(
///     split_module_version_path("mod.com@v1.2.3/package"),
///     ("mod.com", "v1.2.3", "package"),
/// );
/// ```
pub fn split_module_version_path(path: &str) -> (&str, &str, &str) {
    let mut offset = 0;
    for segment in path.split('/') {
        if let Some(at) = segment.find('@') {
            let module_end = offset + at;
            let segment_end = offset + segment.len();
            let suffix = path.get(segment_end + 1..).unwrap_or("");
            return (
                &path[..module_end],
                &path[module_end + 1..segment_end],
                suffix,
            );
        }
        offset += segment.len() + 1;
    }
    (path, "", "")
}

/// Escapes a module path or version for use as a proxy file name.
///
/// Uppercase letters become `!` followed by the lowercase letter, so paths that
/// differ only in case stay distinct on case-insensitive filesystems.
pub fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}
