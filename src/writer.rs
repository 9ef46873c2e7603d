//! Artifact writer.
use std::path::Path;

use rayon::prelude::*;

use crate::error::WriteError;
use crate::pipeline::Artifact;

/// Write every artifact under `root`, creating directories as needed.
/// Existing files are overwritten.
pub fn write_all(root: &Path, artifacts: &[Artifact]) -> Result<(), WriteError> {
    let batch: Vec<(&Path, &Artifact)> = artifacts.iter().map(|a| (root, a)).collect();
    write_batch(&batch)
}

/// Write artifacts that may belong to different roots as one parallel batch.
/// Every write is attempted; the first failure in batch order is returned.
pub fn write_batch(batch: &[(&Path, &Artifact)]) -> Result<(), WriteError> {
    let results: Vec<Result<(), WriteError>> = batch.par_iter().map(|(root, artifact)| write_one(root, artifact)).collect();
    results.into_iter().collect()
}

fn write_one(root: &Path, artifact: &Artifact) -> Result<(), WriteError> {
    let path = root.join(&artifact.path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| WriteError { path: parent.to_path_buf(), source })?;
    }
    std::fs::write(&path, &artifact.text).map_err(|source| WriteError { path: path.clone(), source })?;
    tracing::debug!(path = %path.display(), bytes = artifact.text.len(), "wrote artifact");
    Ok(())
}
