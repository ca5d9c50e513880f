//! Banner records as served by the storefront backend
//!
//! A banner is immutable for the life of a page view. Everything the
//! lifecycle engine needs (activity flag, window, pages, priority, expiry,
//! dismissibility) lives here next to the purely presentational fields.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::page::{DisplayPages, PageContext};

/// Backend identifier of a banner, stable across fetches
pub type BannerId = i64;

/// Styling category of a banner. Has no effect on the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BannerType {
    #[default]
    Promotional,
    Informational,
    Warning,
    Announcement,
    /// Any tag the backend sends that we don't know about, kept verbatim
    Other(String),
}

impl BannerType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Promotional => "promotional",
            Self::Informational => "informational",
            Self::Warning => "warning",
            Self::Announcement => "announcement",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for BannerType {
    fn from(tag: String) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "promotional" | "promo" => Self::Promotional,
            "informational" | "info" => Self::Informational,
            "warning" => Self::Warning,
            "announcement" => Self::Announcement,
            _ => Self::Other(tag),
        }
    }
}

impl From<BannerType> for String {
    fn from(kind: BannerType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for BannerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A promotional overlay notice fetched for a page view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub id: BannerId,

    // ─── Display ────────────────────────────────────────────────────────────
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub banner_type: BannerType,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub button_text: Option<String>,
    #[serde(default)]
    pub button_link: Option<String>,
    #[serde(default)]
    pub button_color: Option<String>,
    #[serde(default)]
    pub background_image_url: Option<String>,

    // ─── Eligibility ────────────────────────────────────────────────────────
    #[serde(default)]
    pub display_pages: DisplayPages,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub end_date: Option<DateTime<Utc>>,
    /// Higher sorts first
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: i32,

    // ─── Lifecycle ──────────────────────────────────────────────────────────
    /// Countdown length in seconds (0 = never auto-hides)
    #[serde(default, deserialize_with = "null_as_default")]
    pub auto_disappear_seconds: u32,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_dismissible: bool,
}

impl Banner {
    /// Minimal active banner shown everywhere, with no window, countdown or styling.
    pub fn new(id: BannerId, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            message: message.into(),
            banner_type: BannerType::default(),
            background_color: None,
            text_color: None,
            button_text: None,
            button_link: None,
            button_color: None,
            background_image_url: None,
            display_pages: DisplayPages::everywhere(),
            is_active: true,
            start_date: None,
            end_date: None,
            priority: 0,
            auto_disappear_seconds: 0,
            is_dismissible: true,
        }
    }

    /// Whether `now` lies within `[start_date, end_date]`.
    ///
    /// Missing bounds are open. An inverted window (start after end) is a
    /// backend data error and never contains any instant.
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && start > end
        {
            return false;
        }
        let started = self.start_date.is_none_or(|start| start <= now);
        let not_ended = self.end_date.is_none_or(|end| now <= end);
        started && not_ended
    }

    pub fn is_shown_on(&self, page: &PageContext) -> bool {
        self.display_pages.matches(page)
    }

    /// Records with a blank title can't be rendered and are never shown
    pub fn has_display_text(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn has_countdown(&self) -> bool {
        self.auto_disappear_seconds > 0
    }

    /// Call-to-action (text, link), offered only when both are present
    pub fn button(&self) -> Option<(&str, &str)> {
        let text = self.button_text.as_deref().filter(|t| !t.trim().is_empty())?;
        let link = self.button_link.as_deref().filter(|l| !l.trim().is_empty())?;
        Some((text, link))
    }
}

fn default_true() -> bool {
    true
}

fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts RFC 3339, naive date-times (taken as UTC), and bare dates.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    parse_timestamp(raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {raw}")))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
