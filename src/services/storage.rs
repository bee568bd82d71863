// src/services/storage.rs
// DOCUMENTATION: On-disk storage for originals and thumbnails
// PURPOSE: Public files live under <root>/public (served at /media),
// private files under <root>/private (admin only)

use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::FolioError;

/// Image formats accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    WebP,
}

impl ImageKind {
    /// Sniff the format from magic bytes; declared content types are not trusted
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageKind::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageKind::Png)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageKind::WebP)
        } else {
            None
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::WebP => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::WebP => "webp",
        }
    }
}

/// Hex encoded SHA-256 of the given bytes
pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root.join("public")
    }

    pub fn private_dir(&self) -> PathBuf {
        self.root.join("private")
    }

    fn dir(&self, is_public: bool) -> PathBuf {
        if is_public {
            self.public_dir()
        } else {
            self.private_dir()
        }
    }

    /// Resolve a stored file; names with path separators are rejected
    pub fn path_for(&self, is_public: bool, file_name: &str) -> Result<PathBuf, FolioError> {
        let plain = Path::new(file_name)
            .file_name()
            .map(|name| name == file_name)
            .unwrap_or(false);
        if !plain || file_name.starts_with('.') {
            return Err(FolioError::InvalidInput(format!(
                "Invalid file name: {}",
                file_name
            )));
        }
        Ok(self.dir(is_public).join(file_name))
    }

    pub async fn ensure_dirs(&self) -> Result<(), FolioError> {
        for dir in [self.public_dir(), self.private_dir()] {
            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                log::error!("Failed to create media dir {}: {}", dir.display(), e);
                FolioError::StorageError(e.to_string())
            })?;
        }
        Ok(())
    }

    /// Write an original and its thumbnail; on failure nothing is left behind
    pub async fn write_pair(
        &self,
        is_public: bool,
        file_name: &str,
        original: &[u8],
        thumbnail_name: &str,
        thumbnail: &[u8],
    ) -> Result<(), FolioError> {
        let original_path = self.path_for(is_public, file_name)?;
        let thumbnail_path = self.path_for(is_public, thumbnail_name)?;

        tokio::fs::write(&original_path, original)
            .await
            .map_err(|e| storage_error("write original", &original_path, e))?;

        if let Err(e) = tokio::fs::write(&thumbnail_path, thumbnail).await {
            let _ = tokio::fs::remove_file(&original_path).await;
            return Err(storage_error("write thumbnail", &thumbnail_path, e));
        }

        log::debug!("Stored {} and {}", original_path.display(), thumbnail_path.display());
        Ok(())
    }

    /// Move files between the public and private directories.
    /// Files already at the destination are left alone; if a later move
    /// fails the earlier ones are undone.
    pub async fn move_files(
        &self,
        file_names: &[&str],
        to_public: bool,
    ) -> Result<(), FolioError> {
        let mut moved: Vec<(PathBuf, PathBuf)> = Vec::new();

        for name in file_names {
            let from = self.path_for(!to_public, name)?;
            let to = self.path_for(to_public, name)?;

            match tokio::fs::rename(&from, &to).await {
                Ok(()) => moved.push((from, to)),
                Err(e) if e.kind() == ErrorKind::NotFound && to.exists() => {
                    log::debug!("{} already in place", to.display());
                }
                Err(e) => {
                    for (orig, dest) in moved.into_iter().rev() {
                        if let Err(undo) = tokio::fs::rename(&dest, &orig).await {
                            log::error!("Failed to undo move of {}: {}", dest.display(), undo);
                        }
                    }
                    return Err(storage_error("move", &from, e));
                }
            }
        }

        Ok(())
    }

    /// Remove files; missing files are not an error
    pub async fn remove_files(&self, is_public: bool, file_names: &[&str]) -> Result<(), FolioError> {
        for name in file_names {
            let path = self.path_for(is_public, name)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    log::warn!("File already gone: {}", path.display());
                }
                Err(e) => return Err(storage_error("remove", &path, e)),
            }
        }
        Ok(())
    }
}

fn storage_error(action: &str, path: &Path, e: std::io::Error) -> FolioError {
    log::error!("Failed to {} {}: {}", action, path.display(), e);
    FolioError::StorageError(format!("{} {}: {}", action, path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, MediaStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        store.ensure_dirs().await.unwrap();
        (dir, store)
    }

    #[test]
    fn test_detect_formats() {
        assert_eq!(ImageKind::detect(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageKind::Jpeg));
        assert_eq!(
            ImageKind::detect(b"\x89PNG\r\n\x1a\nrest"),
            Some(ImageKind::Png)
        );
        assert_eq!(ImageKind::detect(b"RIFF\x00\x00\x00\x00WEBPVP8 "), Some(ImageKind::WebP));
        assert_eq!(ImageKind::detect(b"GIF89a"), None);
        assert_eq!(ImageKind::detect(b""), None);
    }

    #[test]
    fn test_checksum_is_stable_hex_sha256() {
        assert_eq!(
            checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(checksum(b"abc"), checksum(b"abd"));
    }

    #[test]
    fn test_path_for_rejects_traversal() {
        let store = MediaStore::new("/srv/media");
        assert!(store.path_for(true, "a.jpg").is_ok());
        assert!(store.path_for(true, "../etc/passwd").is_err());
        assert!(store.path_for(false, "nested/a.jpg").is_err());
        assert!(store.path_for(false, ".hidden").is_err());
    }

    #[tokio::test]
    async fn test_write_move_and_remove() {
        let (_dir, store) = store().await;

        store
            .write_pair(false, "p.jpg", b"original", "p_thumb.jpg", b"thumb")
            .await
            .unwrap();
        assert!(store.private_dir().join("p.jpg").exists());

        store.move_files(&["p.jpg", "p_thumb.jpg"], true).await.unwrap();
        assert!(store.public_dir().join("p.jpg").exists());
        assert!(store.public_dir().join("p_thumb.jpg").exists());
        assert!(!store.private_dir().join("p.jpg").exists());

        // Moving again is a no-op
        store.move_files(&["p.jpg"], true).await.unwrap();

        store.remove_files(true, &["p.jpg", "p_thumb.jpg", "missing.jpg"]).await.unwrap();
        assert!(!store.public_dir().join("p.jpg").exists());
    }

    #[tokio::test]
    async fn test_failed_move_is_rolled_back() {
        let (_dir, store) = store().await;
        tokio::fs::write(store.private_dir().join("a.jpg"), b"a").await.unwrap();

        let result = store.move_files(&["a.jpg", "missing.jpg"], true).await;
        assert!(matches!(result, Err(FolioError::StorageError(_))));
        assert!(store.private_dir().join("a.jpg").exists());
        assert!(!store.public_dir().join("a.jpg").exists());
    }
}
