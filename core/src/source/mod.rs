//! Banner sources
//!
//! Where candidate banners come from for a page view. The engine only needs
//! "fetch one page of banners"; this module provides an HTTP client for the
//! storefront backend plus file and in-memory sources for previews and tests.
//!
//! Decoding is per record: one malformed banner is logged and skipped, it
//! does not take the rest of the response down with it.

mod file;
mod http;

use marquee_types::{Banner, PageContext};

pub use file::FileBannerSource;
pub use http::HttpBannerSource;

/// Fetches the candidate banner set for a page context
#[allow(async_fn_in_trait)]
pub trait BannerSource {
    async fn fetch(&self, page: &PageContext) -> Result<Vec<Banner>, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("banner request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("banner endpoint returned {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("banner payload is not a JSON array: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Fixed list of banners, returned for every page
#[derive(Debug, Clone, Default)]
pub struct StaticBannerSource {
    banners: Vec<Banner>,
}

impl StaticBannerSource {
    pub fn new(banners: Vec<Banner>) -> Self {
        Self { banners }
    }
}

impl BannerSource for StaticBannerSource {
    async fn fetch(&self, _page: &PageContext) -> Result<Vec<Banner>, FetchError> {
        Ok(self.banners.clone())
    }
}

/// Decode a backend payload, skipping records that don't form a valid banner
pub fn decode_banners(json: &str) -> Result<Vec<Banner>, FetchError> {
    let records: Vec<serde_json::Value> = serde_json::from_str(json).map_err(FetchError::Decode)?;
    let total = records.len();

    let banners: Vec<Banner> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<Banner>(record) {
            Ok(banner) => Some(banner),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed banner record");
                None
            }
        })
        .collect();

    if banners.len() < total {
        tracing::debug!(kept = banners.len(), total, "Decoded banner payload");
    }
    Ok(banners)
}
