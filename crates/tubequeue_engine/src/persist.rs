use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state directory {0:?} is not usable: {1}")]
    StateDir(PathBuf, String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// One file of local client state, such as saved settings, kept in a state
/// directory that is created on first write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFile {
    dir: PathBuf,
    path: PathBuf,
}

impl StateFile {
    pub fn new(dir: impl Into<PathBuf>, filename: &str) -> Self {
        let dir = dir.into();
        let path = dir.join(filename);
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nothing has been saved yet.
    pub fn read(&self) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Replaces the file through a temp file in the same directory and a
    /// rename. A failed write leaves the previous content in place.
    pub fn write(&self, content: &str) -> Result<&Path, PersistError> {
        if self.dir.exists() && !self.dir.is_dir() {
            return Err(self.dir_error("path is not a directory"));
        }
        fs::create_dir_all(&self.dir).map_err(|err| self.dir_error(err))?;

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|err| self.dir_error(err))?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.path).map_err(|err| PersistError::Io(err.error))?;
        Ok(&self.path)
    }

    fn dir_error(&self, reason: impl ToString) -> PersistError {
        PersistError::StateDir(self.dir.clone(), reason.to_string())
    }
}
