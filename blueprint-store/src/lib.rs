//! On-disk layout of uploaded blueprints and their derived artifacts.
//!
//! Every owner gets a `user_<id>/` directory under the store root; the
//! vectorization response for `plan.png` is cached next to it as
//! `plan_r2g.json`.

use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Error types for blueprint storage
#[derive(Debug)]
pub enum StoreError {
    /// The named blueprint does not exist for that owner
    NotFound(PathBuf),
    IoError(std::io::Error),
    ImageError(image::ImageError),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(path) => write!(f, "blueprint not found: {}", path.display()),
            StoreError::IoError(e) => write!(f, "IO error: {}", e),
            StoreError::ImageError(e) => write!(f, "image decoding error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::IoError(err)
    }
}

impl From<image::ImageError> for StoreError {
    fn from(err: image::ImageError) -> Self {
        StoreError::ImageError(err)
    }
}

#[derive(Debug, Clone)]
pub struct BlueprintStore {
    root: PathBuf,
}

impl BlueprintStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn user_dir(&self, owner_id: u64) -> PathBuf {
        self.root.join(format!("user_{}", owner_id))
    }

    pub fn blueprint_path(&self, file_name: &str, owner_id: u64) -> PathBuf {
        self.user_dir(owner_id).join(file_name)
    }

    /// Path of the cached raw vectorization response for a blueprint.
    pub fn vector_cache_path(&self, file_name: &str, owner_id: u64) -> PathBuf {
        let image_path = self.blueprint_path(file_name, owner_id);
        let stem = image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        image_path.with_file_name(format!("{}_r2g.json", stem))
    }

    /// Raw bytes of a stored blueprint. A missing file is reported as a
    /// distinct [`StoreError::NotFound`] so callers can fail before any
    /// pipeline stage runs.
    pub fn read_blueprint(&self, file_name: &str, owner_id: u64) -> Result<Vec<u8>, StoreError> {
        let path = self.blueprint_path(file_name, owner_id);
        if !path.exists() {
            return Err(StoreError::NotFound(path));
        }
        debug!(path = %path.display(), "reading blueprint");
        Ok(fs::read(path)?)
    }

    pub fn load_image(&self, file_name: &str, owner_id: u64) -> Result<DynamicImage, StoreError> {
        let bytes = self.read_blueprint(file_name, owner_id)?;
        Ok(image::load_from_memory(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_layout_matches_convention() {
        let store = BlueprintStore::new("/data/uploads");
        assert_eq!(
            store.blueprint_path("plan.png", 7),
            PathBuf::from("/data/uploads/user_7/plan.png")
        );
        assert_eq!(
            store.vector_cache_path("plan.png", 7),
            PathBuf::from("/data/uploads/user_7/plan_r2g.json")
        );
    }

    #[test]
    fn cache_path_strips_extension_only() {
        let store = BlueprintStore::new("/data/uploads");
        assert_eq!(
            store.vector_cache_path("2d-floor-plan.jpg", 2),
            PathBuf::from("/data/uploads/user_2/2d-floor-plan_r2g.json")
        );
    }

    #[test]
    fn missing_blueprint_is_not_found() {
        let store = BlueprintStore::new(std::env::temp_dir().join("bp-store-missing"));
        let err = store.read_blueprint("nope.png", 1).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn decodes_stored_blueprint_image() {
        let root = std::env::temp_dir().join("bp-store-image-test");
        let store = BlueprintStore::new(&root);
        fs::create_dir_all(store.user_dir(5)).unwrap();

        let img = image::DynamicImage::new_rgb8(8, 6);
        img.save(store.blueprint_path("plan.png", 5)).unwrap();

        let loaded = store.load_image("plan.png", 5).unwrap();
        assert_eq!(loaded.width(), 8);
        assert_eq!(loaded.height(), 6);

        // Stored bytes that are not an image decode to a distinct kind
        fs::write(store.blueprint_path("junk.png", 5), b"junk").unwrap();
        let err = store.load_image("junk.png", 5).unwrap_err();
        assert!(matches!(err, StoreError::ImageError(_)));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn reads_stored_blueprint_bytes() {
        let root = std::env::temp_dir().join("bp-store-read-test");
        let store = BlueprintStore::new(&root);
        fs::create_dir_all(store.user_dir(3)).unwrap();
        fs::write(store.blueprint_path("plan.png", 3), b"not-really-a-png").unwrap();

        let bytes = store.read_blueprint("plan.png", 3).unwrap();
        assert_eq!(bytes, b"not-really-a-png");

        fs::remove_dir_all(&root).unwrap();
    }
}
