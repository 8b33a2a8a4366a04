use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BuildError, Result};

/// Collect every regular file below `dir`, recursively, in sorted path order.
pub fn walk_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk_into(dir.as_ref(), &mut files)?;
    files.sort();
    Ok(files)
}

fn walk_into(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| BuildError::io(&path, e))?;
        if file_type.is_dir() {
            walk_into(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}
