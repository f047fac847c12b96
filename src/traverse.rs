use crate::error::{Result, VolumeError};

use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// One computation of a batch: a series directory and the mask measured on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub directory: PathBuf,
    pub mask: PathBuf,
}

/// Every directory under `root`, `root` included, that has no sub-directory
///
/// # Errors
///
/// Returns `NotFound` if `root` is not a directory
pub fn leaf_directories(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(VolumeError::not_found(root, "Root folder does not exist"));
    }

    let mut leaves = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() && !has_subdirectory(entry.path())? {
            leaves.push(entry.into_path());
        }
    }
    Ok(leaves)
}

/// Pair each leaf directory of `root` with the mask file named `roi_file`
/// in that directory's parent
pub fn batch_jobs(root: impl AsRef<Path>, roi_file: impl AsRef<Path>) -> Result<Vec<BatchJob>> {
    let roi_file = roi_file.as_ref();
    Ok(leaf_directories(root)?
        .into_iter()
        .map(|directory| {
            let mask = directory
                .parent()
                .unwrap_or(&directory)
                .join(roi_file);
            BatchJob { directory, mask }
        })
        .collect())
}

fn has_subdirectory(path: &Path) -> Result<bool> {
    Ok(fs::read_dir(path)?
        .filter_map(std::result::Result::ok)
        .any(|entry| entry.file_type().is_ok_and(|t| t.is_dir())))
}
