use std::path::PathBuf;

use marquee_types::{Banner, PageContext};

use super::{BannerSource, FetchError, decode_banners};

/// Reads the backend's JSON payload from a file
#[derive(Debug, Clone)]
pub struct FileBannerSource {
    path: PathBuf,
}

impl FileBannerSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BannerSource for FileBannerSource {
    async fn fetch(&self, _page: &PageContext) -> Result<Vec<Banner>, FetchError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::Io {
                path: self.path.clone(),
                source: e,
            })?;
        decode_banners(&contents)
    }
}
