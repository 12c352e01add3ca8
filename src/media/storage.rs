use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tokio::fs;

/// Files under a media root, addressed by slash-separated keys.
#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    base_url: String,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: impl Into<String>) -> Self {
        Self {
            base_dir,
            base_url: base_url.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await?;
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve_path(key)?;
        match fs::metadata(path).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let key = key.trim_start_matches('/');
        format!("{base}/{key}")
    }

    /// Maps `key` below the media root; keys may not climb out of it.
    pub fn resolve_path(&self, key: &str) -> Result<PathBuf> {
        let normalized = key.trim_start_matches('/');
        if normalized.is_empty() || normalized.split('/').any(|part| part == "..") {
            bail!("invalid media key: {key:?}");
        }
        Ok(self.base_dir.join(Path::new(normalized)))
    }
}

pub fn generated_key(job_id: &str) -> String {
    format!("generated/{job_id}.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_creates_nested_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().to_path_buf(), "http://localhost/media");
        let key = generated_key("abc");

        assert!(!storage.exists(&key).await.unwrap());
        storage.put(&key, b"png").await.unwrap();
        assert!(storage.exists(&key).await.unwrap());
        assert_eq!(std::fs::read(dir.path().join("generated/abc.png")).unwrap(), b"png");
    }

    #[test]
    fn test_public_url_joins_cleanly() {
        let storage = LocalFileStorage::new(PathBuf::from("/tmp/m"), "http://cdn/media/");
        assert_eq!(storage.public_url("/generated/a.png"), "http://cdn/media/generated/a.png");
    }

    #[test]
    fn test_rejects_parent_segments() {
        let storage = LocalFileStorage::new(PathBuf::from("/tmp/m"), "http://cdn/media");
        assert!(storage.resolve_path("../etc/passwd").is_err());
        assert!(storage.resolve_path("").is_err());
        assert!(storage.resolve_path("generated/x.png").is_ok());
    }
}
