//! txtar text archives.
//!
//! ```text
//! optional comment
//! -- go.mod --
//! module mod.com
//! -- main.go --
//! package main
//! ```
//!
//! A marker line is `-- NAME --` with surrounding whitespace trimmed from the
//! name; a marker whose name trims to nothing is ordinary text. Every file's
//! data ends with a newline; one is added when missing.

use std::collections::BTreeMap;

const MARKER_PREFIX: &[u8] = b"-- ";
const MARKER_SUFFIX: &[u8] = b" --";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    pub comment: Vec<u8>,
    pub files: Vec<ArchiveFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl Archive {
    /// Parse archive text. Parsing never fails: text before the first marker
    /// is the comment and malformed markers are treated as data.
    pub fn parse(data: &[u8]) -> Self {
        let (comment, mut name, mut rest) = find_file_marker(data);
        let mut archive = Archive {
            comment: comment.to_vec(),
            files: Vec::new(),
        };
        while let Some(current) = name {
            let (body, next_name, next_rest) = find_file_marker(rest);
            archive.files.push(ArchiveFile {
                name: current,
                data: fix_newline(body),
            });
            name = next_name;
            rest = next_rest;
        }
        if archive.files.is_empty() {
            archive.comment = fix_newline(&archive.comment);
        }
        archive
    }

    /// Render the archive back to text.
    pub fn format(&self) -> Vec<u8> {
        let mut out = fix_newline(&self.comment);
        for file in &self.files {
            out.extend_from_slice(MARKER_PREFIX);
            out.extend_from_slice(file.name.as_bytes());
            out.extend_from_slice(MARKER_SUFFIX);
            out.push(b'\n');
            out.extend_from_slice(&fix_newline(&file.data));
        }
        out
    }
}

/// Parse fixture text into a name→content map. Later duplicates win.
pub fn unpack(text: &str) -> BTreeMap<String, Vec<u8>> {
    Archive::parse(text.as_bytes())
        .files
        .into_iter()
        .map(|f| (f.name, f.data))
        .collect()
}

/// Returns (data before the next marker, marker name, data after the marker line).
fn find_file_marker(data: &[u8]) -> (&[u8], Option<String>, &[u8]) {
    let mut offset = 0;
    loop {
        let line_start = &data[offset..];
        if let Some((name, after)) = parse_marker(line_start) {
            return (&data[..offset], Some(name), after);
        }
        match line_start.iter().position(|&b| b == b'\n') {
            Some(nl) => offset += nl + 1,
            None => return (data, None, &[]),
        }
    }
}

fn parse_marker(data: &[u8]) -> Option<(String, &[u8])> {
    if !data.starts_with(MARKER_PREFIX) {
        return None;
    }
    let (line, after) = match data.iter().position(|&b| b == b'\n') {
        Some(nl) => (&data[..nl], &data[nl + 1..]),
        None => (data, &data[data.len()..]),
    };
    if !line.ends_with(MARKER_SUFFIX) || line.len() < MARKER_PREFIX.len() + MARKER_SUFFIX.len() {
        return None;
    }
    let name = &line[MARKER_PREFIX.len()..line.len() - MARKER_SUFFIX.len()];
    let name = String::from_utf8_lossy(name).trim().to_string();
    if name.is_empty() {
        return None;
    }
    Some((name, after))
}

fn fix_newline(data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    if !out.is_empty() && !out.ends_with(b"\n") {
        out.push(b'\n');
    }
    out
}
