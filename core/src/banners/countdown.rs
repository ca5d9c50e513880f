//! Countdown scheduler
//!
//! One independent timer per timed banner. Each countdown owns its own
//! origin point, so banners entering the visible set at different moments
//! count down correctly.
//!
//! For a countdown of `N` seconds, `on_tick` fires with `N, N-1, ..., 1`
//! once per second (the first immediately), then `on_expire` fires exactly
//! once, one second after the last tick.
//!
//! Runs on the tokio runtime the caller is in. The host is expected to be a
//! single-threaded (current-thread) runtime, where cancelling from the host
//! task can never interleave with a callback.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use marquee_types::BannerId;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Spacing between countdown ticks
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum CountdownError {
    #[error("no async runtime available to drive countdown timers")]
    NoRuntime,
    #[error("countdown duration must be at least one second")]
    ZeroDuration,
}

/// Starts per-banner countdowns
#[derive(Debug, Clone, Copy, Default)]
pub struct CountdownScheduler;

impl CountdownScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Start counting down `seconds` for `banner_id`.
    ///
    /// `on_tick` receives the remaining whole seconds before each decrement
    /// boundary; `on_expire` runs once when the count would drop below 1.
    /// Neither runs after the returned handle is cancelled or dropped.
    pub fn start<T, E>(
        &self,
        banner_id: BannerId,
        seconds: u32,
        mut on_tick: T,
        on_expire: E,
    ) -> Result<CountdownHandle, CountdownError>
    where
        T: FnMut(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        if seconds == 0 {
            return Err(CountdownError::ZeroDuration);
        }
        let runtime = Handle::try_current().map_err(|_| CountdownError::NoRuntime)?;

        // Set on cancel, and by the task itself right before expiring
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);

        let task = runtime.spawn(async move {
            let mut ticker = time::interval(TICK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            for remaining in (1..=seconds).rev() {
                ticker.tick().await;
                if flag.load(Ordering::Acquire) {
                    return;
                }
                on_tick(remaining);
            }

            ticker.tick().await;
            if flag.swap(true, Ordering::AcqRel) {
                return;
            }
            on_expire();
        });

        tracing::debug!(banner_id, seconds, "Countdown started");
        Ok(CountdownHandle {
            banner_id,
            done,
            task,
        })
    }
}

/// Owned handle to a running countdown. Dropping it cancels the countdown.
#[derive(Debug)]
pub struct CountdownHandle {
    banner_id: BannerId,
    done: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    pub fn banner_id(&self) -> BannerId {
        self.banner_id
    }

    /// Stop all future callbacks. Safe to call repeatedly and after expiry.
    pub fn cancel(&self) {
        if !self.done.swap(true, Ordering::AcqRel) {
            tracing::debug!(banner_id = self.banner_id, "Countdown cancelled");
        }
        self.task.abort();
    }

    /// True once cancelled or expired
    pub fn is_cancelled(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// True once the underlying timer task is gone
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
