use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Result of a single delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed(String),
    /// The deleter refused or could not complete the request.
    Failed(String),
    /// Something unexpected went wrong.
    Faulted(String),
}

impl DeleteOutcome {
    pub fn is_removed(&self) -> bool {
        matches!(self, DeleteOutcome::Removed(_))
    }
}

pub trait Deleter {
    fn delete(&self, path: &Path) -> DeleteOutcome;
}

/// Removes livery folders from disk, refusing anything outside the liveries root.
pub struct FsDeleter {
    root: PathBuf,
}

impl FsDeleter {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_relative() {
            self.root.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

impl Deleter for FsDeleter {
    fn delete(&self, path: &Path) -> DeleteOutcome {
        let full_path = self.resolve(path);

        // Must be strictly below the root, never the root itself. `starts_with`
        // compares components without resolving `..`, so those are refused outright.
        let escapes = full_path
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if escapes || full_path == self.root || !full_path.starts_with(&self.root) {
            return DeleteOutcome::Failed(format!(
                "Safety check failed: {} is not inside {}",
                full_path.display(),
                self.root.display()
            ));
        }

        let result = if full_path.is_dir() {
            fs::remove_dir_all(&full_path)
        } else {
            fs::remove_file(&full_path)
        };

        match result {
            Ok(()) => {
                log::info!("Deleted {}", full_path.display());
                // Drop the aircraft folder once its last livery is gone
                if let Some(parent) = full_path.parent() {
                    if parent != self.root
                        && parent
                            .read_dir()
                            .map(|mut d| d.next().is_none())
                            .unwrap_or(false)
                    {
                        let _ = fs::remove_dir(parent);
                    }
                }
                DeleteOutcome::Removed(format!("Removed {}", full_path.display()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                DeleteOutcome::Failed(format!("{} no longer exists", full_path.display()))
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                DeleteOutcome::Failed(format!("Permission denied: {}", full_path.display()))
            }
            Err(e) => DeleteOutcome::Faulted(format!("{}: {}", full_path.display(), e)),
        }
    }
}
