pub mod deleter;
pub mod livery;
pub mod panel;
pub mod refresh;
pub mod registry;
pub mod scanner;
pub mod settings;
pub mod uninstall;

pub use livery::{FileListing, Livery, LiveryKey};
pub use registry::{Installed, LiverySet, LiveryRegistry, RegistrySnapshot};

use std::path::{Path, PathBuf};
use std::{env, fs};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LiveryError {
    #[error("Liveries folder not found")]
    RootNotFound,
    #[error("Invalid liveries folder: {0}")]
    InvalidRoot(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid file listing: {0}")]
    Listing(#[from] serde_json::Error),
}

/// Per-user configuration directory.
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("org", "x-adox", "Livery-Manager")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".livery-manager"))
}

/// A validated liveries folder.
pub struct LiveriesRoot {
    pub root: PathBuf,
}

impl LiveriesRoot {
    /// Validates that `path` is an existing directory.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, LiveryError> {
        let root = path.as_ref().to_path_buf();

        if !root.exists() {
            return Err(LiveryError::RootNotFound);
        }

        if !root.is_dir() {
            return Err(LiveryError::InvalidRoot(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        Ok(Self { root })
    }

    pub fn load_listing(path: &Path) -> Result<FileListing, LiveryError> {
        let content = fs::read_to_string(path)?;
        Ok(FileListing::from_json(&content)?)
    }

    /// Looks for a liveries folder in the usual per-user locations.
    pub fn try_find_root() -> Option<PathBuf> {
        let mut candidate_dirs: Vec<PathBuf> = Vec::new();

        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            if let Ok(home) = env::var("HOME") {
                candidate_dirs.push(PathBuf::from(&home).join(".liveries"));
                candidate_dirs.push(PathBuf::from(&home).join("Liveries"));
            }
        }

        #[cfg(target_os = "windows")]
        {
            if let Ok(local_appdata) = env::var("LOCALAPPDATA") {
                candidate_dirs.push(PathBuf::from(local_appdata).join("Liveries"));
            }
        }

        candidate_dirs.into_iter().find(|dir| dir.is_dir())
    }
}
