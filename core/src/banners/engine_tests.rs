//! Tests for the banner lifecycle engine
//!
//! Timer-driven scenarios run on a paused tokio clock so every tick lands at
//! an exact virtual instant.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use marquee_types::{Banner, BannerId, DisplayPages, PageContext};
use tokio::time::{self, Instant};

use super::engine::{BannerChange, BannerEngine, BannerState, Clock, DismissError};
use super::ledger::{DISMISSED_BANNERS_KEY, DismissalLedger};
use crate::source::{BannerSource, FetchError, StaticBannerSource};
use crate::storage::{KeyValueStore, MemoryStore};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 20, 18, 0, 0).unwrap()
}

fn home() -> PageContext {
    PageContext::new("home")
}

/// Active banner shown everywhere
fn make_banner(id: BannerId, priority: i32, auto_disappear_seconds: u32) -> Banner {
    let mut banner = Banner::new(id, format!("Banner {id}"), "Limited time offer");
    banner.priority = priority;
    banner.auto_disappear_seconds = auto_disappear_seconds;
    banner
}

fn make_engine(store: MemoryStore) -> BannerEngine<MemoryStore, impl Clock> {
    BannerEngine::with_clock(home(), DismissalLedger::open(store), now)
}

struct FailingSource;

impl BannerSource for FailingSource {
    async fn fetch(&self, _page: &PageContext) -> Result<Vec<Banner>, FetchError> {
        Err(FetchError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Countdown lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_timed_banner_ticks_then_auto_hides() {
    let mut engine = make_engine(MemoryStore::new());
    engine.on_candidates_changed(vec![make_banner(1, 0, 5)]);

    assert_eq!(engine.visible_ids(), &[1]);
    assert_eq!(engine.remaining_secs(1), Some(5), "countdown shows full value at once");

    let started = Instant::now();
    let mut changes = Vec::new();
    while let Some(change) = engine.next_change().await {
        changes.push(change);
    }

    let expected: Vec<BannerChange> = (1..=5)
        .rev()
        .map(|remaining| BannerChange::Countdown {
            banner_id: 1,
            remaining,
        })
        .chain([BannerChange::AutoHidden { banner_id: 1 }])
        .collect();
    assert_eq!(changes, expected);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6));

    assert!(engine.visible_ids().is_empty());
    assert_eq!(engine.state_of(1), Some(BannerState::AutoHidden));
    assert_eq!(engine.active_countdowns(), 0);
    assert!(engine.ledger().is_empty(), "auto-hide is never persisted");
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_mid_countdown_removes_and_persists() {
    let store = MemoryStore::new();
    let mut engine = make_engine(store.clone());
    engine.on_candidates_changed(vec![make_banner(1, 0, 5)]);

    time::sleep(Duration::from_millis(1500)).await;
    let changes = engine.process_pending();
    assert_eq!(
        changes,
        vec![
            BannerChange::Countdown { banner_id: 1, remaining: 5 },
            BannerChange::Countdown { banner_id: 1, remaining: 4 },
        ]
    );
    assert_eq!(engine.remaining_secs(1), Some(4));

    engine.dismiss(1).unwrap();
    assert!(engine.visible_ids().is_empty());
    assert_eq!(engine.state_of(1), Some(BannerState::Dismissed));
    assert_eq!(engine.active_countdowns(), 0);
    assert_eq!(
        store.get_item(DISMISSED_BANNERS_KEY).unwrap().as_deref(),
        Some("[1]")
    );
    assert!(DismissalLedger::open(store.clone()).load().contains(&1));

    time::sleep(Duration::from_secs(10)).await;
    assert!(engine.process_pending().is_empty(), "no callbacks after dismissal");
    assert!(engine.next_change().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_independent_countdowns() {
    let mut engine = make_engine(MemoryStore::new());
    engine.on_candidates_changed(vec![make_banner(1, 0, 2), make_banner(2, 0, 4)]);

    time::sleep(Duration::from_millis(2500)).await;
    engine.process_pending();

    assert_eq!(engine.state_of(1), Some(BannerState::AutoHidden));
    assert_eq!(engine.state_of(2), Some(BannerState::Visible));
    assert_eq!(engine.remaining_secs(2), Some(2));
    assert_eq!(engine.visible_ids(), &[2]);
}

#[tokio::test(start_paused = true)]
async fn test_untimed_banner_has_no_countdown() {
    let mut engine = make_engine(MemoryStore::new());
    engine.on_candidates_changed(vec![make_banner(1, 0, 0)]);

    assert_eq!(engine.active_countdowns(), 0);
    assert_eq!(engine.remaining_secs(1), None);
    assert!(engine.next_change().await.is_none());

    time::sleep(Duration::from_secs(60)).await;
    assert_eq!(engine.visible_ids(), &[1]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Candidate set replacement
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_new_candidates_reset_auto_hidden_but_not_dismissed() {
    let mut engine = make_engine(MemoryStore::new());
    let candidates = vec![make_banner(1, 0, 1), make_banner(2, 0, 0)];
    engine.on_candidates_changed(candidates.clone());

    time::sleep(Duration::from_millis(1500)).await;
    engine.process_pending();
    assert_eq!(engine.state_of(1), Some(BannerState::AutoHidden));

    engine.dismiss(2).unwrap();
    assert!(engine.visible_ids().is_empty());

    // Fresh fetch for a new page load
    engine.on_candidates_changed(candidates);
    assert_eq!(engine.visible_ids(), &[1]);
    assert_eq!(engine.remaining_secs(1), Some(1));
    assert_eq!(engine.state_of(2), Some(BannerState::Dismissed));
}

#[tokio::test(start_paused = true)]
async fn test_navigation_cancels_countdowns_and_drops_queued_ticks() {
    let mut engine = make_engine(MemoryStore::new());
    let mut home_only = make_banner(1, 0, 3);
    home_only.display_pages = DisplayPages::new(["home"]);
    engine.on_candidates_changed(vec![home_only.clone()]);

    // Ticks are queued but not yet applied
    time::sleep(Duration::from_millis(1500)).await;

    engine.navigate(PageContext::new("order"), vec![home_only]);
    assert_eq!(engine.page(), &PageContext::new("order"));
    assert_eq!(engine.active_countdowns(), 0);
    assert_eq!(engine.state_of(1), Some(BannerState::Ineligible));
    assert!(engine.process_pending().is_empty());

    time::sleep(Duration::from_secs(10)).await;
    assert!(engine.process_pending().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_restart_ignores_ticks_from_previous_countdown() {
    let mut engine = make_engine(MemoryStore::new());
    let banner = make_banner(1, 0, 3);
    engine.on_candidates_changed(vec![banner.clone()]);

    time::sleep(Duration::from_millis(1500)).await;
    engine.on_candidates_changed(vec![banner]);

    // Old ticks (3, 2) are still in the channel and must not apply
    assert!(engine.process_pending().is_empty());
    assert_eq!(engine.remaining_secs(1), Some(3));

    time::sleep(Duration::from_millis(500)).await;
    assert_eq!(
        engine.process_pending(),
        vec![BannerChange::Countdown { banner_id: 1, remaining: 3 }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_everything() {
    let mut engine = make_engine(MemoryStore::new());
    engine.on_candidates_changed(vec![make_banner(1, 0, 3), make_banner(2, 0, 8)]);
    assert_eq!(engine.active_countdowns(), 2);

    engine.shutdown();
    assert_eq!(engine.active_countdowns(), 0);
    assert!(engine.next_change().await.is_none());

    time::sleep(Duration::from_secs(20)).await;
    assert!(engine.process_pending().is_empty());
}

#[tokio::test]
async fn test_load_failure_yields_no_banners() {
    let mut engine = make_engine(MemoryStore::new());
    engine.on_candidates_changed(vec![make_banner(1, 0, 0)]);

    engine.load(&FailingSource).await;
    assert!(engine.candidates().is_empty());
    assert!(engine.visible_ids().is_empty());
}

#[tokio::test]
async fn test_load_from_source() {
    let mut engine = make_engine(MemoryStore::new());
    let source = StaticBannerSource::new(vec![make_banner(1, 1, 0), make_banner(2, 3, 0)]);
    engine.load(&source).await;
    assert_eq!(engine.visible_ids(), &[2, 1]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Filtering through the engine
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_priority_order_in_views() {
    let mut engine = make_engine(MemoryStore::new());
    engine.on_candidates_changed(vec![
        make_banner(2, 5, 0),
        make_banner(1, 1, 0),
        make_banner(3, 5, 0),
    ]);

    let ids: Vec<BannerId> = engine.views().iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![2, 3, 1]);
}

#[test]
fn test_inactive_banner_never_visible() {
    let mut engine = make_engine(MemoryStore::new());
    let mut banner = make_banner(1, 0, 5);
    banner.is_active = false;
    engine.on_candidates_changed(vec![banner]);

    assert!(engine.visible_ids().is_empty());
    assert_eq!(engine.state_of(1), Some(BannerState::Ineligible));
    assert!(!engine.is_eligible(1));
    assert_eq!(engine.active_countdowns(), 0);
}

#[test]
fn test_expired_window_is_ineligible() {
    let mut engine = make_engine(MemoryStore::new());
    let mut banner = make_banner(1, 0, 0);
    banner.end_date = Some(now() - chrono::Duration::hours(1));
    engine.on_candidates_changed(vec![banner, make_banner(2, 0, 0)]);

    assert_eq!(engine.visible_ids(), &[2]);
    assert_eq!(engine.state_of(1), Some(BannerState::Ineligible));
    assert_eq!(engine.state_of(99), None);
}

#[test]
fn test_dismissals_survive_a_new_engine() {
    let store = MemoryStore::new();
    let candidates = vec![make_banner(1, 0, 0), make_banner(2, 0, 0)];

    let mut first = make_engine(store.clone());
    first.on_candidates_changed(candidates.clone());
    first.dismiss(2).unwrap();
    drop(first);

    let mut reloaded = make_engine(store);
    reloaded.on_candidates_changed(candidates);
    assert_eq!(reloaded.visible_ids(), &[1]);
    assert_eq!(reloaded.state_of(2), Some(BannerState::Dismissed));
}

// ─────────────────────────────────────────────────────────────────────────────
// Dismiss preconditions
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_dismiss_requires_dismissible() {
    let mut engine = make_engine(MemoryStore::new());
    let mut pinned = make_banner(1, 0, 0);
    pinned.is_dismissible = false;
    engine.on_candidates_changed(vec![pinned]);

    assert_eq!(engine.dismiss(1), Err(DismissError::NotDismissible(1)));
    assert_eq!(engine.visible_ids(), &[1]);
    assert!(engine.ledger().is_empty());
    assert_eq!(engine.views()[0].dismiss, None);
}

#[test]
fn test_dismiss_requires_visible() {
    let mut engine = make_engine(MemoryStore::new());
    let mut inactive = make_banner(1, 0, 0);
    inactive.is_active = false;
    engine.on_candidates_changed(vec![inactive]);

    assert_eq!(engine.dismiss(1), Err(DismissError::NotVisible(1)));
    assert_eq!(engine.dismiss(42), Err(DismissError::NotVisible(42)));
    assert!(engine.ledger().is_empty());
}

#[test]
fn test_dismiss_twice_matches_dismiss_once() {
    let store = MemoryStore::new();
    let mut engine = make_engine(store.clone());
    engine.on_candidates_changed(vec![make_banner(3, 0, 0)]);

    engine.dismiss(3).unwrap();
    let after_once = store.get_item(DISMISSED_BANNERS_KEY).unwrap();

    assert_eq!(engine.dismiss(3), Err(DismissError::NotVisible(3)));
    assert_eq!(store.get_item(DISMISSED_BANNERS_KEY).unwrap(), after_once);
    assert_eq!(engine.ledger().len(), 1);
}

#[test]
fn test_dismiss_through_view_action() {
    let mut engine = make_engine(MemoryStore::new());
    engine.on_candidates_changed(vec![make_banner(1, 0, 0), make_banner(2, 0, 0)]);

    let action = engine.views()[1].dismiss.unwrap();
    engine.dismiss_with(action).unwrap();
    assert_eq!(engine.visible_ids(), &[1]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Degraded timers
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_no_runtime_shows_banner_without_countdown() {
    // Plain #[test]: no tokio runtime, so countdowns can't start
    let mut engine = make_engine(MemoryStore::new());
    engine.on_candidates_changed(vec![make_banner(1, 0, 5)]);

    assert_eq!(engine.visible_ids(), &[1]);
    assert_eq!(engine.active_countdowns(), 0);
    let view = &engine.views()[0];
    assert_eq!(view.remaining_secs, None);
    assert_eq!(view.countdown_label, None);

    engine.dismiss(1).unwrap();
    assert!(engine.visible_ids().is_empty());
}
