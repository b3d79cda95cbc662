pub mod naming;
pub mod reader;
pub mod writer;

pub use naming::{daily_file_name, DATASET_EXTENSION, IMAGE_EXTENSION};
pub use reader::QvpDataset;
pub use writer::write_dataset;

use crate::prelude::{OverwritePolicy, QvpError, QvpResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Use `directory` when given, otherwise the user's home directory.
pub fn resolve_directory(directory: Option<&Path>) -> QvpResult<PathBuf> {
    match directory {
        Some(dir) => Ok(dir.to_path_buf()),
        None => dirs::home_dir().ok_or_else(|| {
            QvpError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "no output directory given and no home directory found",
            ))
        }),
    }
}

/// Make room for a new output at `path` according to `policy`.
pub(crate) fn prepare_output(path: &Path, policy: OverwritePolicy) -> QvpResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    if path.exists() {
        match policy {
            OverwritePolicy::Refuse => return Err(QvpError::OutputExists(path.to_path_buf())),
            OverwritePolicy::Replace => fs::remove_file(path)?,
        }
    }
    Ok(())
}
