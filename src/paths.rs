use crate::error::{Result, RemixError};
use directories::ProjectDirs;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

const STAGED_STEM: &str = "temp_input";

pub fn default_staging_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "PhantomTrax", "phantom-trax")
        .ok_or(RemixError::StagingDirUnavailable)?;
    let mut p = PathBuf::from(proj.cache_dir());
    p.push("uploads");
    Ok(p)
}

/// Fixed path an upload with extension `ext` is staged at inside `dir`.
pub fn staged_input_path(dir: &Path, ext: &str) -> PathBuf {
    dir.join(format!("{STAGED_STEM}.{ext}"))
}

/// Copies the user's clip to the staging path, replacing any earlier upload.
///
/// The staged copy is left in place afterwards.
pub fn stage_upload(src: &Path, dir: &Path) -> Result<PathBuf> {
    if !src.is_file() {
        return Err(RemixError::InvalidRequest(format!(
            "Input file not found: {}",
            src.display()
        )));
    }

    let ext = src
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "wav".into());

    fs::create_dir_all(dir)?;
    let dest = staged_input_path(dir, &ext);
    fs::copy(src, &dest)?;
    debug!("staged {} at {}", src.display(), dest.display());
    Ok(dest)
}
