//! Resolves the CLI's positional example path against the `demos/` directory
//! shipped alongside the workspace (§6 "Positional: an example path, with or
//! without extension").

use anyhow::{Context, Result};
use cairs_ir::Document;
use std::path::{Path, PathBuf};

/// The workspace's example documents live beside the crates, not inside this
/// crate — resolved relative to this crate's own manifest so `cargo run`
/// works from any working directory.
fn demos_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos"))
}

/// `name` may be a path that already exists, a bare demo name (`"air_arithmetic"`),
/// or a demo name with its `.json` extension already attached.
pub fn resolve(name: &str) -> Result<PathBuf> {
    let direct = Path::new(name);
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }
    let with_ext = direct.with_extension("json");
    if with_ext.is_file() {
        return Ok(with_ext);
    }
    let in_demos = demos_dir().join(format!("{name}.json"));
    if in_demos.is_file() {
        return Ok(in_demos);
    }
    anyhow::bail!("no example named \"{name}\" (looked for it directly, with a .json extension, and under demos/)")
}

pub fn load(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading \"{}\"", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("\"{}\" is not a valid CAIRS document", path.display()))
}

/// Every `.json` file under `demos/`, by stem, sorted for stable `list` output.
pub fn list() -> Result<Vec<String>> {
    let dir = demos_dir();
    let mut names = Vec::new();
    let entries = std::fs::read_dir(&dir).with_context(|| format!("reading demos directory \"{}\"", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
