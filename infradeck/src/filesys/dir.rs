//! Directory handle

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs;

use crate::errors::DeckError;
use crate::filesys::file::File;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dir {
    path: PathBuf,
}

impl Dir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .is_ok_and(|meta| meta.is_dir())
    }

    /// Create the directory along with any missing parents
    pub async fn create(&self) -> Result<(), DeckError> {
        Ok(fs::create_dir_all(&self.path).await?)
    }

    /// Create only this directory. Fails with `AlreadyExists` if it is taken,
    /// which callers use to claim a unique name.
    pub async fn create_new(&self) -> std::io::Result<()> {
        fs::create_dir(&self.path).await
    }

    /// Remove the directory tree; a missing directory is not an error
    pub async fn delete(&self) -> Result<(), DeckError> {
        match fs::remove_dir_all(&self.path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Immediate subdirectories, sorted by path
    pub async fn list_dirs(&self) -> Result<Vec<Dir>, DeckError> {
        let mut entries = fs::read_dir(&self.path).await?;
        let mut dirs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                dirs.push(Dir::new(entry.path()));
            }
        }
        dirs.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(dirs)
    }

    pub async fn modified(&self) -> Result<SystemTime, DeckError> {
        Ok(fs::metadata(&self.path).await?.modified()?)
    }

    pub fn file(&self, name: &str) -> File {
        File::new(self.path.join(name))
    }

    pub fn subdir(&self, name: &str) -> Dir {
        Dir::new(self.path.join(name))
    }

    /// Fresh uniquely named directory under the system temp dir
    pub async fn create_temp_dir(prefix: &str) -> Result<Dir, DeckError> {
        let dir = Dir::new(std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4())));
        dir.create().await?;
        Ok(dir)
    }
}
