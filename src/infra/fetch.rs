//! Asset retrieval from the world's data directory or over HTTP.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use percent_encoding::percent_decode_str;

use crate::export::ports::{AssetFetcher, FetchError};

/// Reads assets relative to a data directory; `http(s)` sources are
/// downloaded.
pub struct LocalFetcher {
    data_dir: PathBuf,
    client: reqwest::Client,
}

impl LocalFetcher {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Path of a local source under the data directory.
    ///
    /// Rejects absolute paths and anything that climbs out of the directory.
    fn local_path(&self, source: &str) -> Result<PathBuf, FetchError> {
        let decoded: Cow<'_, str> = percent_decode_str(source).decode_utf8_lossy();
        let relative = Path::new(decoded.as_ref());
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe || decoded.is_empty() {
            return Err(FetchError::UnsafePath(source.to_string()));
        }
        Ok(self.data_dir.join(relative))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let http = |err: reqwest::Error| FetchError::Http {
            url: url.to_string(),
            reason: err.to_string(),
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(http)?;
        let bytes = response.bytes().await.map_err(http)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl AssetFetcher for LocalFetcher {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, FetchError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            tracing::debug!(url = %source, "downloading asset");
            return self.download(source).await;
        }

        let path = self.local_path(source)?;
        tracing::debug!(path = %path.display(), "reading asset");
        tokio::fs::read(&path).await.map_err(|err| FetchError::Io {
            path: path.display().to_string(),
            source: err,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn rejects_paths_outside_the_data_dir() {
        let fetcher = LocalFetcher::new("/data");
        for source in ["../secrets.txt", "/etc/passwd", "maps/../../x.png", "%2E%2E/x.png", ""] {
            assert!(
                matches!(fetcher.local_path(source), Err(FetchError::UnsafePath(_))),
                "{source} should be rejected"
            );
        }
    }

    #[test]
    fn decodes_percent_escapes() {
        let fetcher = LocalFetcher::new("/data");
        assert_eq!(
            fetcher.local_path("maps/Old%20Keep.webp").unwrap(),
            PathBuf::from("/data/maps/Old Keep.webp")
        );
    }

    #[tokio::test]
    async fn reads_local_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("tokens")).unwrap();
        fs::write(dir.path().join("tokens/bob.png"), b"png").unwrap();

        let fetcher = LocalFetcher::new(dir.path());
        assert_eq!(fetcher.fetch("tokens/bob.png").await.unwrap(), b"png");
        assert!(matches!(
            fetcher.fetch("tokens/missing.png").await,
            Err(FetchError::Io { .. })
        ));
    }
}
