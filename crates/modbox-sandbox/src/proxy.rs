//! File-backed module proxy.
//!
//! Proxy fixtures name files `module@version/path`. Each module version is
//! written in the layout the go command reads from a `file://` GOPROXY:
//!
//! ```text
//! <dir>/<escaped module>/@v/list
//! <dir>/<escaped module>/@v/<escaped version>.info
//! <dir>/<escaped module>/@v/<escaped version>.mod
//! <dir>/<escaped module>/@v/<escaped version>.zip
//! ```

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use modbox_core::module_path::{escape_path, split_module_version_path};
use serde::Serialize;
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::error::ProxyError;
use crate::workdir::to_uri;

type ModuleFiles = BTreeMap<String, Vec<u8>>;

#[derive(Debug)]
pub struct Proxy {
    dir: PathBuf,
    url: String,
}

#[derive(Serialize)]
struct VersionInfo<'a> {
    #[serde(rename = "Version")]
    version: &'a str,
    #[serde(rename = "Time")]
    time: String,
}

impl Proxy {
    /// Populate `dir` from the proxy fixture `text`.
    ///
    /// Entries without an `@version` are not module content and are skipped.
    pub fn new(dir: &Path, text: &str) -> Result<Self, ProxyError> {
        let mut modules: BTreeMap<(String, String), ModuleFiles> = BTreeMap::new();
        for (name, data) in modbox_fs::unpack(text) {
            let (module, version, suffix) = split_module_version_path(&name);
            if version.is_empty() {
                tracing::warn!(entry = %name, "proxy fixture entry has no @version; skipping");
                continue;
            }
            if !is_valid_module_path(module) {
                return Err(ProxyError::InvalidModulePath(module.to_string()));
            }
            modules
                .entry((module.to_string(), version.to_string()))
                .or_default()
                .insert(suffix.to_string(), data);
        }

        let mut versions: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for ((module, version), files) in &modules {
            write_module_version(dir, module, version, files)?;
            versions
                .entry(module.as_str())
                .or_default()
                .push(version.as_str());
        }
        for (module, list) in versions {
            let path = version_dir(dir, module).join("list");
            let mut body = list.join("\n");
            body.push('\n');
            fs::write(&path, body).map_err(|source| ProxyError::Io { path, source })?;
        }

        tracing::debug!(dir = %dir.display(), versions = modules.len(), "populated proxy");
        Ok(Self {
            dir: dir.to_path_buf(),
            url: Self::url_for(dir),
        })
    }

    /// The proxy address, usable as a GOPROXY value.
    pub fn goproxy(&self) -> &str {
        &self.url
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// GOPROXY value for a proxy rooted at `dir`.
    pub fn url_for(dir: &Path) -> String {
        to_uri(dir)
    }
}

/// Module paths become directories under the proxy root, so every element
/// must be a plain name.
fn is_valid_module_path(module: &str) -> bool {
    !module.is_empty()
        && module
            .split('/')
            .all(|part| !part.is_empty() && part != "." && part != ".." && !part.contains('\\'))
}

fn version_dir(root: &Path, module: &str) -> PathBuf {
    escape_path(module)
        .split('/')
        .fold(root.to_path_buf(), |path, part| path.join(part))
        .join("@v")
}

fn write_module_version(
    root: &Path,
    module: &str,
    version: &str,
    files: &ModuleFiles,
) -> Result<(), ProxyError> {
    let dir = version_dir(root, module);
    fs::create_dir_all(&dir).map_err(|source| ProxyError::Io {
        path: dir.clone(),
        source,
    })?;
    let base = escape_path(version);

    let info = serde_json::to_vec(&VersionInfo {
        version,
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    })?;
    write_file(&dir.join(format!("{}.info", base)), &info)?;

    let modfile = match files.get("go.mod") {
        Some(data) => data.clone(),
        None => format!("module {}\n", module).into_bytes(),
    };
    write_file(&dir.join(format!("{}.mod", base)), &modfile)?;

    let zip_path = dir.join(format!("{}.zip", base));
    write_zip(&zip_path, module, version, files).map_err(|source| ProxyError::Zip {
        path: zip_path.clone(),
        source,
    })?;
    Ok(())
}

fn write_file(path: &Path, data: &[u8]) -> Result<(), ProxyError> {
    fs::write(path, data).map_err(|source| ProxyError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_zip(
    path: &Path,
    module: &str,
    version: &str,
    files: &ModuleFiles,
) -> zip::result::ZipResult<()> {
    let mut zw = ZipWriter::new(File::create(path)?);
    for (suffix, data) in files {
        if suffix.is_empty() {
            continue;
        }
        zw.start_file(format!("{}@{}/{}", module, version, suffix), FileOptions::default())?;
        zw.write_all(data)?;
    }
    zw.finish()?;
    Ok(())
}
