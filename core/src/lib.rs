//! marquee-core: promotional banner lifecycle for the storefront
//!
//! Fetches candidate banners for a page, decides which ones render, runs
//! their auto-expiry countdowns, and remembers what the client dismissed.

pub mod banners;
pub mod context;
pub mod source;
pub mod storage;

// Re-exports for convenience
pub use banners::{
    BannerChange, BannerEngine, BannerState, BannerView, DismissAction, DismissError,
    DismissalLedger,
};
pub use context::AppConfig;
pub use marquee_types::{Banner, BannerId, BannerType, DisplayPages, PageContext};
pub use source::{BannerSource, FetchError, FileBannerSource, HttpBannerSource, StaticBannerSource};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
