//! Render-facing projection of the visible set
//!
//! Everything a renderer needs to draw one banner, plus the token to
//! dismiss it. Nothing about countdown handles leaks through here.

use marquee_types::formatting::format_auto_close_label;
use marquee_types::{Banner, BannerId, BannerType};
use serde::Serialize;

/// A visible banner paired with its live countdown value
#[derive(Debug, Clone, Copy)]
pub struct VisibleBanner<'a> {
    pub banner: &'a Banner,
    /// Whole seconds left before auto-hide (None = no countdown shown)
    pub remaining_secs: Option<u32>,
}

/// Token that dismisses one banner when redeemed through
/// [`BannerEngine::dismiss_with`](super::BannerEngine::dismiss_with)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DismissAction {
    pub banner_id: BannerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerButton {
    pub text: String,
    pub link: String,
    pub color: Option<String>,
}

/// Display fields of one visible banner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerView {
    pub id: BannerId,
    pub title: String,
    pub message: String,
    pub banner_type: BannerType,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    pub background_image_url: Option<String>,
    pub button: Option<BannerButton>,
    pub remaining_secs: Option<u32>,
    /// e.g. "Auto-closes in 4s", only while time remains
    pub countdown_label: Option<String>,
    /// Present only for dismissible banners
    pub dismiss: Option<DismissAction>,
}

impl From<VisibleBanner<'_>> for BannerView {
    fn from(visible: VisibleBanner<'_>) -> Self {
        let banner = visible.banner;
        let button = banner.button().map(|(text, link)| BannerButton {
            text: text.to_string(),
            link: link.to_string(),
            color: banner.button_color.clone(),
        });
        let remaining_secs = visible.remaining_secs.filter(|secs| *secs > 0);

        Self {
            id: banner.id,
            title: banner.title.clone(),
            message: banner.message.clone(),
            banner_type: banner.banner_type.clone(),
            background_color: banner.background_color.clone(),
            text_color: banner.text_color.clone(),
            background_image_url: banner.background_image_url.clone(),
            button,
            remaining_secs,
            countdown_label: remaining_secs.map(format_auto_close_label),
            dismiss: banner.is_dismissible.then_some(DismissAction {
                banner_id: banner.id,
            }),
        }
    }
}
