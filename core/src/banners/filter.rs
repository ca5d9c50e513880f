//! Visibility filter
//!
//! Pure function from (candidates, dismissals, auto-hides, time, page) to the
//! ordered list of banners that should render right now. No timers, no
//! storage, no side effects.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use marquee_types::{Banner, BannerId, PageContext};

/// Whether a banner passes the active, display-text, window and page checks.
/// Dismissal and auto-hide state are not considered here.
pub fn is_eligible(banner: &Banner, now: DateTime<Utc>, page: &PageContext) -> bool {
    banner.is_active
        && banner.has_display_text()
        && banner.is_within_window(now)
        && banner.is_shown_on(page)
}

/// Compute the visible set for one snapshot in time.
///
/// `now` is sampled once by the caller and used for every banner. The result
/// is ordered by descending priority, ties by ascending id. If the backend
/// sent the same id twice, only the first record is considered.
pub fn compute_visible<'a>(
    candidates: &'a [Banner],
    dismissed: &HashSet<BannerId>,
    auto_hidden: &HashSet<BannerId>,
    now: DateTime<Utc>,
    page: &PageContext,
) -> Vec<&'a Banner> {
    let mut seen: HashSet<BannerId> = HashSet::with_capacity(candidates.len());
    let mut visible: Vec<&Banner> = candidates
        .iter()
        .filter(|banner| seen.insert(banner.id))
        .filter(|banner| !dismissed.contains(&banner.id) && !auto_hidden.contains(&banner.id))
        .filter(|banner| is_eligible(banner, now, page))
        .collect();

    visible.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
    visible
}
