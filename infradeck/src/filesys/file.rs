//! File handle

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;

use crate::errors::DeckError;

/// Path to a regular file; nothing is opened until a method is called
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    path: PathBuf,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    pub async fn read_string(&self) -> Result<String, DeckError> {
        Ok(fs::read_to_string(&self.path).await?)
    }

    pub async fn read_json<T: DeserializeOwned>(&self) -> Result<T, DeckError> {
        let text = self.read_string().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Replace the file contents, creating missing parent directories
    pub async fn write_string(&self, contents: &str) -> Result<(), DeckError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, contents).await?;
        Ok(())
    }

    pub async fn write_json<T: Serialize>(&self, value: &T) -> Result<(), DeckError> {
        self.write_string(&serde_json::to_string_pretty(value)?).await
    }

    /// Remove the file; a missing file is not an error
    pub async fn delete(&self) -> Result<(), DeckError> {
        match fs::remove_file(&self.path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
