use std::time::Duration;

use marquee_types::{Banner, PageContext};

use super::{BannerSource, FetchError, decode_banners};

/// Fetches banners from the storefront backend at `GET /api/banners?page=<page>`
#[derive(Debug, Clone)]
pub struct HttpBannerSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBannerSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Full URL of the banners endpoint (without the query string)
    pub fn endpoint(&self) -> String {
        format!("{}/api/banners", self.base_url.trim_end_matches('/'))
    }
}

impl BannerSource for HttpBannerSource {
    async fn fetch(&self, page: &PageContext) -> Result<Vec<Banner>, FetchError> {
        let response = self
            .client
            .get(self.endpoint())
            .query(&[("page", page.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        let banners = decode_banners(&body)?;
        tracing::debug!(page = %page, count = banners.len(), "Fetched banners");
        Ok(banners)
    }
}
