use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use std::io;
use std::path::{Path, PathBuf};

/// Local file system access used by the native strategies.
#[async_trait]
pub trait MediaFileSystem: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Read a file as a base64 string
    async fn read_base64(&self, path: &Path) -> io::Result<String> {
        let data = self.read(path).await?;
        Ok(general_purpose::STANDARD.encode(data))
    }
}

/// [`MediaFileSystem`] backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

#[async_trait]
impl MediaFileSystem for TokioFileSystem {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}

/// Local file path behind a `file://` URI or a bare absolute path.
///
/// Other schemes (`content://`, `http://`, `data:`) have no local path.
pub fn local_path(uri: &str) -> Option<PathBuf> {
    let raw = match uri.strip_prefix("file://") {
        Some(rest) => rest,
        None if uri.starts_with('/') => uri,
        None => return None,
    };

    let decoded = urlencoding::decode(raw).ok()?;
    if decoded.is_empty() {
        return None;
    }
    Some(PathBuf::from(decoded.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_path() {
        assert_eq!(
            local_path("file:///data/user/0/cache/arm%20chair.jpg"),
            Some(PathBuf::from("/data/user/0/cache/arm chair.jpg"))
        );
        assert_eq!(local_path("/tmp/a.png"), Some(PathBuf::from("/tmp/a.png")));
        assert_eq!(local_path("content://media/external/images/42"), None);
        assert_eq!(local_path("https://cdn.example.com/a.png"), None);
        assert_eq!(local_path("file://"), None);
    }

    #[tokio::test]
    async fn test_tokio_file_system_base64() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, b"hello").unwrap();

        let files = TokioFileSystem;
        assert!(files.exists(&path).await);
        assert!(!files.exists(&dir.path().join("missing.bin")).await);
        assert_eq!(files.read_base64(&path).await.unwrap(), "aGVsbG8=");
    }
}
