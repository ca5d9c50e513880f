//! Page context scoping
//!
//! Every banner lists the pages it may appear on. The wildcard tag `"all"`
//! matches every page context.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Wildcard page tag matching every page context.
pub const ALL_PAGES: &str = "all";

/// Logical page identifier used to scope which banners are eligible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageContext(String);

impl PageContext {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The context used when a page does not name itself.
    pub fn all() -> Self {
        Self(ALL_PAGES.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PageContext {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for PageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageContext {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Set of page tags a banner is eligible to appear on.
///
/// Decoding is lenient: the backend may send an array of tags or a single
/// tag string. Any other shape decodes to the empty set, which matches
/// nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DisplayPages(Vec<String>);

impl DisplayPages {
    pub fn new<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self(tags.into_iter().map(Into::into).collect())
    }

    /// Eligible on every page.
    pub fn everywhere() -> Self {
        Self(vec![ALL_PAGES.to_string()])
    }

    /// True if the set holds the wildcard or the exact page tag
    pub fn matches(&self, page: &PageContext) -> bool {
        self.0
            .iter()
            .any(|tag| tag == ALL_PAGES || tag == page.as_str())
    }

    pub fn tags(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PagesRepr {
    List(Vec<String>),
    Single(String),
    Other(serde::de::IgnoredAny),
}

impl<'de> Deserialize<'de> for DisplayPages {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match PagesRepr::deserialize(deserializer)? {
            PagesRepr::List(tags) => Self(tags),
            PagesRepr::Single(tag) => Self(vec![tag]),
            PagesRepr::Other(_) => Self::default(),
        })
    }
}
