//! Turns a loaded `Config`'s `file:`/`language:` entries into a `Project`
//! (§4.3: each file read into the next free arena region, then tiled once).

use anyhow::{Context, Result};
use cmpr_block::{Language, Project};
use cmpr_config::Config;
use std::path::Path;

pub fn load_project(config: &Config) -> Result<Project> {
    let mut project = Project::new();
    for entry in &config.project_files {
        let bytes = std::fs::read(&entry.path)
            .with_context(|| format!("{}: could not read project file", entry.path.display()))?;
        project.load_file(&entry.path, entry.language, &bytes);
    }
    project
        .reparse_all()
        .context("block tiling failed (invariant violation)")?;
    Ok(project)
}

/// Guess a block language from a file's extension, for files added at
/// runtime via `:addfile`/`:addlib` rather than listed in the config.
pub fn infer_language(path: &Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?;
    Language::from_str_name(ext)
}
