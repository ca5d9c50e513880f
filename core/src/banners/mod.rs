//! Promotional banner lifecycle
//!
//! This module provides:
//! - **Filter**: pure visibility computation over the candidate set
//! - **Ledger**: persisted record of banners the client dismissed
//! - **Countdown**: one independent auto-expiry timer per timed banner
//! - **Engine**: orchestrator owning all of the above
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  BannerSource (backend / file)                   │
//! │        "GET /api/banners?page=home" -> candidate set             │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                   on_candidates_changed()
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │           compute_visible(candidates, ledger, auto-hidden)       │
//! │  "Sale (pri 5), Shipping notice (pri 1)"                         │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!              one countdown per visible timed banner
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │        CountdownEvent (tick / expired) -> BannerEngine           │
//! │        expired -> auto-hidden -> recompute                       │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                        BannerView list
//! ```

pub mod countdown;
mod engine;
pub mod filter;
mod ledger;
mod view;

#[cfg(test)]
mod engine_tests;

pub use countdown::{CountdownError, CountdownHandle, CountdownScheduler};
pub use engine::{
    BannerChange, BannerEngine, BannerState, Clock, CountdownEvent, CountdownEventKind,
    DismissError, SystemClock,
};
pub use filter::compute_visible;
pub use ledger::{DISMISSED_BANNERS_KEY, DismissalLedger};
pub use view::{BannerButton, BannerView, DismissAction, VisibleBanner};
