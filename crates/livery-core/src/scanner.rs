// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::livery::Livery;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Liveries folder not found: {0}")]
    RootMissing(PathBuf),
    #[error("IO error while scanning {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of the installed-liveries list.
pub trait Scanner {
    fn list_installed(&self) -> Result<Vec<Livery>, ScanError>;
}

/// Name of the optional per-livery manifest written at install time.
pub const MANIFEST_FILE: &str = "livery.json";

const THUMBNAIL_NAMES: [&str; 3] = ["thumbnail.jpg", "thumbnail.JPG", "thumbnail.png"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    check_sum: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    small_image: Option<String>,
}

/// Scans a liveries folder laid out as `<root>/<airplane>/<livery>/`.
///
/// Every directory at depth two is an installed livery. Hidden entries are
/// skipped. Metadata comes from an optional `livery.json` manifest, with
/// size and modification time taken from disk.
pub struct DiskScanner {
    root: PathBuf,
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

impl DiskScanner {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_manifest(dir: &Path) -> Result<Manifest, ScanError> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(Manifest::default());
        }
        let content = fs::read_to_string(&path).map_err(|source| ScanError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ScanError::Manifest { path, source })
    }

    /// Total size in bytes of all files below `dir`.
    pub fn folder_size(dir: &Path) -> u64 {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.metadata().ok())
            .map(|m| m.len())
            .sum()
    }

    fn read_livery(airplane: &str, dir: &Path) -> Result<Livery, ScanError> {
        let manifest = Self::read_manifest(dir)?;
        let folder_name = dir
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let last_modified = fs::metadata(dir)
            .and_then(|m| m.modified())
            .map(|t| chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339())
            .map_err(|source| ScanError::Io {
                path: dir.to_path_buf(),
                source,
            })?;

        let thumbnail = THUMBNAIL_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
            .map(|p| p.to_string_lossy().to_string());

        Ok(Livery {
            airplane: airplane.to_string(),
            file_name: manifest.file_name.unwrap_or(folder_name),
            display_name: manifest.display_name,
            install_location: Some(dir.to_path_buf()),
            last_modified,
            check_sum: manifest.check_sum.unwrap_or_default(),
            size: Self::folder_size(dir),
            image: manifest.image.or(thumbnail),
            small_image: manifest.small_image,
        })
    }
}

impl Scanner for DiskScanner {
    fn list_installed(&self) -> Result<Vec<Livery>, ScanError> {
        if !self.root.is_dir() {
            return Err(ScanError::RootMissing(self.root.clone()));
        }

        let walker = WalkDir::new(&self.root)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));

        let mut results = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(self.root.as_path()).to_path_buf();
                ScanError::Io {
                    path,
                    source: e.into(),
                }
            })?;

            if !entry.file_type().is_dir() {
                continue;
            }

            let airplane = match entry.path().parent().and_then(|p| p.file_name()) {
                Some(name) => name.to_string_lossy().to_string(),
                None => continue,
            };

            results.push(Self::read_livery(&airplane, entry.path())?);
        }

        log::info!(
            "Found {} installed liveries in {}",
            results.len(),
            self.root.display()
        );
        Ok(results)
    }
}
