//! Banner lifecycle engine
//!
//! Owns the candidate set, the dismissal ledger, and one countdown per
//! visible timed banner. Every relevant event (new candidates, a dismissal,
//! an auto-hide) triggers a synchronous recomputation of the visible set,
//! which in turn starts or cancels countdowns.
//!
//! Per-banner state once it is a candidate:
//!
//! ```text
//!   Eligible ──► Visible ──dismiss()──► Dismissed   (persisted, absorbing)
//!      │            │
//!      │            └──countdown 0──► AutoHidden    (this candidate set only)
//!      ▼
//!   Ineligible  (window / page / active flag failed)
//! ```
//!
//! Countdown callbacks never touch engine state. They post [`CountdownEvent`]s
//! onto a channel the engine drains, and each event carries the generation
//! of the countdown that produced it. Events from a countdown that has since
//! been cancelled no longer match and are dropped.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use marquee_types::{Banner, BannerId, PageContext};
use tokio::sync::mpsc;

use super::countdown::{CountdownHandle, CountdownScheduler};
use super::filter::{compute_visible, is_eligible};
use super::ledger::DismissalLedger;
use super::view::{BannerView, DismissAction, VisibleBanner};
use crate::source::BannerSource;
use crate::storage::KeyValueStore;

/// Source of "now" for visibility checks
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<F: Fn() -> DateTime<Utc>> Clock for F {
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

/// Where a candidate banner currently sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerState {
    Visible,
    Dismissed,
    AutoHidden,
    Ineligible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DismissError {
    #[error("banner {0} is not currently visible")]
    NotVisible(BannerId),
    #[error("banner {0} cannot be dismissed")]
    NotDismissible(BannerId),
}

/// Message posted by a running countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownEvent {
    pub banner_id: BannerId,
    pub generation: u64,
    pub kind: CountdownEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEventKind {
    Tick(u32),
    Expired,
}

/// Observable change produced by applying a countdown event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerChange {
    Countdown { banner_id: BannerId, remaining: u32 },
    AutoHidden { banner_id: BannerId },
}

/// Live countdown for one visible banner
#[derive(Debug)]
struct ActiveCountdown {
    generation: u64,
    remaining: u32,
    // Dropping the handle cancels the timer
    _handle: CountdownHandle,
}

pub struct BannerEngine<S, C = SystemClock> {
    page: PageContext,
    candidates: Vec<Banner>,
    ledger: DismissalLedger<S>,
    auto_hidden: HashSet<BannerId>,
    /// Result of the last recomputation, in display order
    visible: Vec<BannerId>,

    // ─── Countdowns ─────────────────────────────────────────────────────────
    scheduler: CountdownScheduler,
    countdowns: HashMap<BannerId, ActiveCountdown>,
    /// Banners whose countdown could not be started; shown without one
    untimed: HashSet<BannerId>,
    next_generation: u64,
    events_tx: mpsc::UnboundedSender<CountdownEvent>,
    events_rx: mpsc::UnboundedReceiver<CountdownEvent>,

    clock: C,
}

impl<S: KeyValueStore> BannerEngine<S, SystemClock> {
    /// Create an engine for `page` with no candidates yet
    pub fn new(page: PageContext, ledger: DismissalLedger<S>) -> Self {
        Self::with_clock(page, ledger, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> BannerEngine<S, C> {
    pub fn with_clock(page: PageContext, ledger: DismissalLedger<S>, clock: C) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            page,
            candidates: Vec::new(),
            ledger,
            auto_hidden: HashSet::new(),
            visible: Vec::new(),
            scheduler: CountdownScheduler::new(),
            countdowns: HashMap::new(),
            untimed: HashSet::new(),
            next_generation: 0,
            events_tx,
            events_rx,
            clock,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inputs
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch candidates for the current page and replace the candidate set.
    /// A failed fetch yields zero candidates; the page renders without banners.
    pub async fn load<B: BannerSource>(&mut self, source: &B) {
        let candidates = match source.fetch(&self.page).await {
            Ok(banners) => banners,
            Err(e) => {
                tracing::warn!(page = %self.page, error = %e, "Banner fetch failed, showing none");
                Vec::new()
            }
        };
        self.on_candidates_changed(candidates);
    }

    /// Replace the candidate set. Cancels every running countdown, forgets
    /// auto-hides from the previous set, and recomputes visibility.
    pub fn on_candidates_changed(&mut self, candidates: Vec<Banner>) {
        self.countdowns.clear();
        self.auto_hidden.clear();
        self.untimed.clear();
        self.candidates = candidates;
        tracing::info!(
            page = %self.page,
            candidates = self.candidates.len(),
            "Banner candidates replaced"
        );
        self.recompute();
    }

    /// Switch page context along with its freshly fetched candidates
    pub fn navigate(&mut self, page: PageContext, candidates: Vec<Banner>) {
        self.page = page;
        self.on_candidates_changed(candidates);
    }

    /// Dismiss a visible, dismissible banner. Persists to the ledger, stops
    /// its countdown, and recomputes.
    pub fn dismiss(&mut self, banner_id: BannerId) -> Result<(), DismissError> {
        if !self.visible.contains(&banner_id) {
            return Err(DismissError::NotVisible(banner_id));
        }
        let dismissible = self
            .candidate(banner_id)
            .is_some_and(|banner| banner.is_dismissible);
        if !dismissible {
            return Err(DismissError::NotDismissible(banner_id));
        }

        self.ledger.record(banner_id);
        self.countdowns.remove(&banner_id);
        tracing::info!(banner_id, "Banner dismissed");
        self.recompute();
        Ok(())
    }

    pub fn dismiss_with(&mut self, action: DismissAction) -> Result<(), DismissError> {
        self.dismiss(action.banner_id)
    }

    /// Tear down: cancel every countdown. Dropping the engine does the same.
    pub fn shutdown(&mut self) {
        if !self.countdowns.is_empty() {
            tracing::debug!(count = self.countdowns.len(), "Cancelling banner countdowns");
        }
        self.countdowns.clear();
        while self.events_rx.try_recv().is_ok() {}
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Countdown events
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply a countdown event. Returns the resulting change, or `None` if the
    /// event came from a countdown that is no longer live.
    pub fn handle_event(&mut self, event: CountdownEvent) -> Option<BannerChange> {
        let active = self.countdowns.get_mut(&event.banner_id)?;
        if active.generation != event.generation {
            return None;
        }

        match event.kind {
            CountdownEventKind::Tick(remaining) => {
                active.remaining = remaining;
                tracing::debug!(banner_id = event.banner_id, remaining, "Countdown tick");
                Some(BannerChange::Countdown {
                    banner_id: event.banner_id,
                    remaining,
                })
            }
            CountdownEventKind::Expired => {
                self.countdowns.remove(&event.banner_id);
                self.auto_hidden.insert(event.banner_id);
                tracing::info!(banner_id = event.banner_id, "Banner auto-hidden");
                self.recompute();
                Some(BannerChange::AutoHidden {
                    banner_id: event.banner_id,
                })
            }
        }
    }

    /// Apply every queued event without waiting. Returns the changes applied.
    pub fn process_pending(&mut self) -> Vec<BannerChange> {
        let mut changes = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            changes.extend(self.handle_event(event));
        }
        changes
    }

    /// Wait for the next live change. Returns `None` immediately when no
    /// countdown is running, since nothing would ever arrive.
    pub async fn next_change(&mut self) -> Option<BannerChange> {
        loop {
            if self.countdowns.is_empty() {
                return None;
            }
            let event = self.events_rx.recv().await?;
            if let Some(change) = self.handle_event(event) {
                return Some(change);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Outputs
    // ─────────────────────────────────────────────────────────────────────────

    /// Visible banners in display order with their live countdown values
    pub fn visible(&self) -> Vec<VisibleBanner<'_>> {
        self.visible
            .iter()
            .filter_map(|id| self.candidate(*id))
            .map(|banner| VisibleBanner {
                banner,
                remaining_secs: self.countdowns.get(&banner.id).map(|c| c.remaining),
            })
            .collect()
    }

    /// Render-ready projection of [`visible`](Self::visible)
    pub fn views(&self) -> Vec<BannerView> {
        self.visible().into_iter().map(BannerView::from).collect()
    }

    pub fn visible_ids(&self) -> &[BannerId] {
        &self.visible
    }

    pub fn remaining_secs(&self, banner_id: BannerId) -> Option<u32> {
        self.countdowns.get(&banner_id).map(|c| c.remaining)
    }

    pub fn state_of(&self, banner_id: BannerId) -> Option<BannerState> {
        self.candidate(banner_id)?;
        Some(if self.ledger.contains(banner_id) {
            BannerState::Dismissed
        } else if self.auto_hidden.contains(&banner_id) {
            BannerState::AutoHidden
        } else if self.visible.contains(&banner_id) {
            BannerState::Visible
        } else {
            BannerState::Ineligible
        })
    }

    /// Whether a candidate passes the window/page/active checks right now,
    /// ignoring dismissals and auto-hides
    pub fn is_eligible(&self, banner_id: BannerId) -> bool {
        self.candidate(banner_id)
            .is_some_and(|banner| is_eligible(banner, self.clock.now(), &self.page))
    }

    pub fn page(&self) -> &PageContext {
        &self.page
    }

    pub fn candidates(&self) -> &[Banner] {
        &self.candidates
    }

    pub fn ledger(&self) -> &DismissalLedger<S> {
        &self.ledger
    }

    /// Number of countdowns currently running
    pub fn active_countdowns(&self) -> usize {
        self.countdowns.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Recomputation
    // ─────────────────────────────────────────────────────────────────────────

    fn candidate(&self, banner_id: BannerId) -> Option<&Banner> {
        self.candidates.iter().find(|b| b.id == banner_id)
    }

    fn recompute(&mut self) {
        let now = self.clock.now();
        let visible = compute_visible(
            &self.candidates,
            self.ledger.dismissed(),
            &self.auto_hidden,
            now,
            &self.page,
        );
        let ids: Vec<BannerId> = visible.iter().map(|b| b.id).collect();
        let to_start: Vec<(BannerId, u32)> = visible
            .iter()
            .filter(|b| b.has_countdown())
            .map(|b| (b.id, b.auto_disappear_seconds))
            .collect();

        // No countdown outlives its banner's presence in the visible set
        self.countdowns.retain(|id, _| ids.contains(id));

        for (banner_id, seconds) in to_start {
            if !self.countdowns.contains_key(&banner_id) && !self.untimed.contains(&banner_id) {
                self.start_countdown(banner_id, seconds);
            }
        }

        tracing::debug!(page = %self.page, visible = ?ids, "Visible banners recomputed");
        self.visible = ids;
    }

    fn start_countdown(&mut self, banner_id: BannerId, seconds: u32) {
        let generation = self.next_generation;
        self.next_generation += 1;

        let tick_tx = self.events_tx.clone();
        let expire_tx = self.events_tx.clone();
        let started = self.scheduler.start(
            banner_id,
            seconds,
            move |remaining| {
                let _ = tick_tx.send(CountdownEvent {
                    banner_id,
                    generation,
                    kind: CountdownEventKind::Tick(remaining),
                });
            },
            move || {
                let _ = expire_tx.send(CountdownEvent {
                    banner_id,
                    generation,
                    kind: CountdownEventKind::Expired,
                });
            },
        );

        match started {
            Ok(handle) => {
                self.countdowns.insert(
                    banner_id,
                    ActiveCountdown {
                        generation,
                        remaining: seconds,
                        _handle: handle,
                    },
                );
            }
            Err(e) => {
                tracing::warn!(banner_id, error = %e, "Countdown unavailable, showing banner without one");
                self.untimed.insert(banner_id);
            }
        }
    }
}

impl<S, C> Drop for BannerEngine<S, C> {
    fn drop(&mut self) {
        // Cancel timers before the event channel goes away
        self.countdowns.clear();
    }
}
