//! Host container discovery
//!
//! Phocus keeps its catalog inside a sandboxed container whose directory
//! name is a UUID, so nothing can be hardcoded. The probe scans the
//! containers area for a Preferences entry naming the bundle id and
//! prefers a candidate that already holds the store file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ImportError;

/// Bundle id of the Phocus 2 app.
pub const PHOCUS_BUNDLE_ID: &str = "com.hasselblad.mobile2";

const STORE_RELATIVE: &str = "Data/Library/CatalogDB/Album.db";
const IMAGES_RELATIVE: &str = "Data/Documents/Images";
const PREVIEW_CACHE_RELATIVE: &str = "Data/Library/PreviewCache";

/// Resolved locations inside the host app's container, captured once at
/// startup and threaded through the importer.
#[derive(Debug, Clone)]
pub struct ContainerLayout {
    pub container_root: PathBuf,
    pub images_dir: PathBuf,
    pub preview_cache_dir: PathBuf,
    pub store_path: PathBuf,
}

impl ContainerLayout {
    /// Probe `~/Library/Containers` for the Phocus container.
    pub fn discover() -> Result<Self, ImportError> {
        let home = dirs::home_dir().ok_or_else(|| {
            ImportError::ContainerNotFound("could not determine home directory".into())
        })?;
        Self::discover_in(&home.join("Library/Containers"), PHOCUS_BUNDLE_ID)
    }

    /// Scan `containers_root` for a container whose Preferences folder
    /// holds an item whose name contains `bundle_id`. When several match,
    /// prefer the one that already has the store file.
    pub fn discover_in(containers_root: &Path, bundle_id: &str) -> Result<Self, ImportError> {
        if !containers_root.is_dir() {
            return Err(ImportError::ContainerNotFound(format!(
                "no such directory: {}",
                containers_root.display()
            )));
        }

        let mut candidates = Vec::new();
        for entry in fs::read_dir(containers_root)? {
            let dir = entry?.path();
            if !dir.is_dir() {
                continue;
            }
            let prefs = dir.join("Data/Library/Preferences");
            if !prefs.is_dir() {
                continue;
            }
            let Ok(items) = fs::read_dir(&prefs) else {
                continue;
            };
            let matches = items
                .filter_map(|item| item.ok())
                .any(|item| item.file_name().to_string_lossy().contains(bundle_id));
            if matches {
                candidates.push(dir);
            }
        }

        if candidates.is_empty() {
            return Err(ImportError::ContainerNotFound(format!(
                "nothing under {} references bundle id {} (open the app once, or check the path)",
                containers_root.display(),
                bundle_id
            )));
        }

        // Directory listing order is arbitrary; sort for a stable pick.
        candidates.sort();

        if let Some(with_store) = candidates
            .iter()
            .find(|candidate| candidate.join(STORE_RELATIVE).exists())
        {
            return Ok(Self::at(with_store.clone()));
        }

        if candidates.len() > 1 {
            println!(
                "⚠️  {} containers match bundle id {}, none holds the store; using the first:",
                candidates.len(),
                bundle_id
            );
            for candidate in &candidates {
                println!("   - {}", candidate.display());
            }
        }
        Ok(Self::at(candidates.remove(0)))
    }

    /// Build the layout for a known container root (also used by tests).
    pub fn at(container_root: PathBuf) -> Self {
        Self {
            images_dir: container_root.join(IMAGES_RELATIVE),
            preview_cache_dir: container_root.join(PREVIEW_CACHE_RELATIVE),
            store_path: container_root.join(STORE_RELATIVE),
            container_root,
        }
    }

    /// Create the two managed directories. The store file itself must
    /// already exist; only the host app may create it.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.images_dir)?;
        fs::create_dir_all(&self.preview_cache_dir)?;
        Ok(())
    }

    pub fn container_uuid(&self) -> String {
        self.container_root
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}
