use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// The server answered, but not with a 2xx. Nothing was written.
    #[error("download failed with status {status}")]
    Status { status: StatusCode },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Downloads `url` into the project's directory under `output_root`, never
/// overwriting an existing file: name collisions get an incrementing `_1`,
/// `_2`, … suffix before the extension.
pub async fn fetch(
    client: &reqwest::Client,
    output_root: &Path,
    url: &str,
    project_name: &str,
    base_filename: &str,
) -> Result<PathBuf, DownloadError> {
    let project_dir = output_root.join(project_name);
    fs::create_dir_all(&project_dir)?;
    let target = next_free_path(&project_dir, base_filename);

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status { status });
    }

    let bytes = response.bytes().await?;
    fs::write(&target, &bytes)?;
    debug!("Wrote {} bytes to {}", bytes.len(), target.display());
    Ok(target)
}

/// First path under `dir` derived from `base_filename` that does not exist
/// yet. Linear probe without an upper bound; fine for a single-user tool.
fn next_free_path(dir: &Path, base_filename: &str) -> PathBuf {
    let first = dir.join(base_filename);
    if !first.exists() {
        return first;
    }

    let base = Path::new(base_filename);
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| base_filename.to_string());
    let extension = base.extension().map(|e| e.to_string_lossy().into_owned());

    let mut index = 1usize;
    loop {
        let name = match &extension {
            Some(ext) => format!("{stem}_{index}.{ext}"),
            None => format!("{stem}_{index}"),
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
        index += 1;
    }
}
