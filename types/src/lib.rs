//! Shared banner types for marquee
//!
//! The data model handed from the storefront backend to the banner engine
//! and on to whatever renders the banners. Kept free of runtime concerns so
//! both the engine and the CLI can depend on it.

mod banner;
pub mod formatting;
mod page;

pub use banner::{Banner, BannerId, BannerType};
pub use page::{DisplayPages, PageContext, ALL_PAGES};
