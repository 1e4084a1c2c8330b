//! Data directory layout
//!
//! ```text
//! <base_dir>/
//!   settings.json
//!   logs/
//!   workspaces/<terraform|ansible>/<target>-<millis>-<seq>/
//! ```

use std::path::PathBuf;

use crate::errors::DeckError;
use crate::filesys::dir::Dir;
use crate::filesys::file::File;

#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn settings_file(&self) -> File {
        File::new(self.base_dir.join("settings.json"))
    }

    pub fn workspaces_dir(&self) -> Dir {
        Dir::new(self.base_dir.join("workspaces"))
    }

    pub fn logs_dir(&self) -> Dir {
        Dir::new(self.base_dir.join("logs"))
    }

    /// Make sure the directories the server writes into exist
    pub async fn setup(&self) -> Result<(), DeckError> {
        for dir in [self.workspaces_dir(), self.logs_dir()] {
            dir.create().await?;
        }
        Ok(())
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::new("./infradeck-data")
    }
}
