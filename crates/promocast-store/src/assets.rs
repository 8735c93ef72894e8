//! Filesystem asset store for uploaded broadcast images.

use std::path::{Path, PathBuf};

use promocast_core::error::{PromoError, Result};
use promocast_core::traits::AssetStore;

/// Resolves upload filenames inside a single directory. The admin UI
/// writes files there; the core only reads.
pub struct FsAssetStore {
    dir: PathBuf,
}

impl FsAssetStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }
}

impl AssetStore for FsAssetStore {
    fn resolve(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() {
            return Err(PromoError::AssetNotFound("empty reference".into()));
        }
        // Refuse path traversal out of the upload dir
        let file_name = Path::new(name)
            .file_name()
            .ok_or_else(|| PromoError::AssetNotFound(name.to_string()))?;
        let path = self.dir.join(file_name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(PromoError::AssetNotFound(name.to_string()))
        }
    }
}
