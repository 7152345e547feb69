use anyhow::Result;
use modbox_core::module_path::split_module_version_path;
use serde_json::json;

/// `modbox split <path>`
pub fn cmd_split(path: &str) -> Result<()> {
    println!("{}", render(path));
    Ok(())
}

fn render(path: &str) -> serde_json::Value {
    let (module, version, suffix) = split_module_version_path(path);
    json!({
        "module": module,
        "version": version,
        "suffix": suffix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_versioned_path() {
        let v = render("example.com@v1.2.3/blah/blah.go");
        assert_eq!(v["module"], "example.com");
        assert_eq!(v["version"], "v1.2.3");
        assert_eq!(v["suffix"], "blah/blah.go");
    }

    #[test]
    fn test_render_unversioned_path() {
        let v = render("README");
        assert_eq!(v["module"], "README");
        assert_eq!(v["version"], "");
        assert_eq!(v["suffix"], "");
    }
}
