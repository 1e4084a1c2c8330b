//! Per-run workspace directories

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::errors::DeckError;
use crate::filesys::dir::Dir;
use crate::filesys::file::File;
use crate::utils::unix_millis;

/// Attempts before giving up on finding a free directory name
const MAX_CREATE_ATTEMPTS: usize = 16;

/// Which tool a workspace is prepared for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkspaceKind {
    Terraform,
    Ansible,
}

impl WorkspaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceKind::Terraform => "terraform",
            WorkspaceKind::Ansible => "ansible",
        }
    }
}

/// Paths of workspaces whose run has not finished yet
type InUse = Arc<Mutex<HashSet<PathBuf>>>;

/// Marks a workspace path as in use until the last handle is dropped
#[derive(Debug)]
struct Lease {
    path: PathBuf,
    in_use: InUse,
}

impl Lease {
    fn acquire(in_use: &InUse, path: &Path) -> Self {
        if let Ok(mut paths) = in_use.lock() {
            paths.insert(path.to_path_buf());
        }
        Self {
            path: path.to_path_buf(),
            in_use: in_use.clone(),
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if let Ok(mut paths) = self.in_use.lock() {
            paths.remove(&self.path);
        }
    }
}

/// A freshly created, run-private directory.
///
/// The janitor leaves it alone while any clone of this handle is alive.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub kind: WorkspaceKind,
    pub target_id: u64,
    dir: Dir,
    _lease: Arc<Lease>,
}

impl Workspace {
    pub fn dir(&self) -> &Dir {
        &self.dir
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Creates workspaces under `<root>/<kind>/<target>-<millis>-<seq>`
#[derive(Debug)]
pub struct WorkspaceManager {
    root: Dir,
    seq: AtomicU64,
    in_use: InUse,
}

impl WorkspaceManager {
    pub fn new(root: Dir) -> Self {
        Self {
            root,
            seq: AtomicU64::new(0),
            in_use: InUse::default(),
        }
    }

    /// Number of workspaces whose run still holds them
    pub fn in_use(&self) -> usize {
        self.in_use.lock().map(|paths| paths.len()).unwrap_or(0)
    }

    fn is_in_use(&self, path: &Path) -> bool {
        self.in_use
            .lock()
            .map(|paths| paths.contains(path))
            .unwrap_or(true)
    }

    /// Create a new empty directory, unique per call even for the same
    /// kind and target within the same millisecond.
    pub async fn create_workspace(
        &self,
        kind: WorkspaceKind,
        target_id: u64,
    ) -> Result<Workspace, DeckError> {
        let parent = self.root.subdir(kind.as_str());
        parent.create().await.map_err(|e| {
            DeckError::WorkspaceError(format!(
                "Failed to create {}: {}",
                parent.path().display(),
                e
            ))
        })?;

        for _ in 0..MAX_CREATE_ATTEMPTS {
            let seq = self.seq.fetch_add(1, Ordering::Relaxed);
            let dir = parent.subdir(&format!("{}-{}-{}", target_id, unix_millis(), seq));
            // held before the directory exists so a concurrent prune never sees it unleased
            let lease = Lease::acquire(&self.in_use, dir.path());

            match dir.create_new().await {
                Ok(()) => {
                    debug!("Created workspace {}", dir.path().display());
                    return Ok(Workspace {
                        kind,
                        target_id,
                        dir,
                        _lease: Arc::new(lease),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    // left behind by a previous process with the same counter value
                    continue;
                }
                Err(e) => {
                    return Err(DeckError::WorkspaceError(format!(
                        "Failed to create workspace {}: {}",
                        dir.path().display(),
                        e
                    )));
                }
            }
        }

        Err(DeckError::WorkspaceError(format!(
            "No free workspace name for {} {} after {} attempts",
            kind.as_str(),
            target_id,
            MAX_CREATE_ATTEMPTS
        )))
    }

    /// Write `content` to `filename` inside the workspace
    pub async fn write_file(
        &self,
        workspace: &Workspace,
        content: &str,
        filename: &str,
    ) -> Result<File, DeckError> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename == "."
            || filename == ".."
        {
            return Err(DeckError::WorkspaceError(format!(
                "Invalid workspace file name: {:?}",
                filename
            )));
        }

        let file = workspace.dir().file(filename);
        file.write_string(content).await.map_err(|e| {
            DeckError::WorkspaceError(format!(
                "Failed to write {}: {}",
                file.path().display(),
                e
            ))
        })?;
        Ok(file)
    }

    /// Delete workspaces last modified at least `max_age` ago.
    ///
    /// Workspaces of runs still in progress are skipped. Returns how many
    /// were removed. A missing root counts as empty.
    pub async fn prune(&self, max_age: Duration) -> Result<usize, DeckError> {
        if !self.root.exists().await {
            return Ok(0);
        }

        let now = SystemTime::now();
        let mut removed = 0;

        for kind_dir in self.root.list_dirs().await? {
            for workspace in kind_dir.list_dirs().await? {
                if self.is_in_use(workspace.path()) {
                    debug!("Keeping {}: run in progress", workspace.path().display());
                    continue;
                }
                let modified = match workspace.modified().await {
                    Ok(modified) => modified,
                    Err(e) => {
                        warn!("Skipping {}: {}", workspace.path().display(), e);
                        continue;
                    }
                };
                let age = now.duration_since(modified).unwrap_or_default();
                if age >= max_age {
                    workspace.delete().await?;
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            info!("Pruned {} expired workspaces", removed);
        }
        Ok(removed)
    }
}
