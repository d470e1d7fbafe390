//! Phase deadline timer for Metaphora rooms.
//!
//! A room has at most one outstanding deadline at a time: the end of the
//! expression phase, the game clock, the reveal delay, the voting window.
//! [`DeadlineTimer`] holds that one deadline together with a caller-chosen
//! token, and re-arming always replaces (cancels) whatever was there.
//!
//! # Disarmed timers pend forever
//!
//! [`DeadlineTimer::wait`] never resolves while nothing is armed. That is
//! what lets it sit in a room actor's `tokio::select!` loop unconditionally:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = mailbox.recv() => { /* apply command, then timer.sync(...) */ }
//!         token = timer.wait() => { room.on_timer(token, now_ms()); }
//!     }
//! }
//! ```
//!
//! The returned token identifies *which* arming fired. Callers compare it
//! to their current state before acting, so a deadline that was armed for
//! a phase the room has since left is ignored.

use std::fmt;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

struct Armed<T> {
    token: T,
    at: Instant,
}

/// A single cancellable deadline carrying a token.
pub struct DeadlineTimer<T> {
    armed: Option<Armed<T>>,
}

impl<T> Default for DeadlineTimer<T> {
    fn default() -> Self {
        Self { armed: None }
    }
}

impl<T: Clone + PartialEq + fmt::Debug> DeadlineTimer<T> {
    /// Creates a disarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer to fire `after` from now, replacing any previous
    /// deadline.
    pub fn arm(&mut self, token: T, after: Duration) {
        self.arm_at(token, Instant::now() + after);
    }

    /// Arms the timer to fire at `at`, replacing any previous deadline.
    pub fn arm_at(&mut self, token: T, at: Instant) {
        if let Some(prev) = &self.armed {
            trace!(token = ?prev.token, "replacing armed deadline");
        }
        debug!(?token, in_ms = at.saturating_duration_since(Instant::now()).as_millis() as u64, "deadline armed");
        self.armed = Some(Armed { token, at });
    }

    /// Disarms the timer. Returns the token that was armed, if any.
    pub fn cancel(&mut self) -> Option<T> {
        let prev = self.armed.take().map(|a| a.token);
        if let Some(token) = &prev {
            debug!(?token, "deadline cancelled");
        }
        prev
    }

    /// Makes the timer match `desired`.
    ///
    /// - `None` disarms.
    /// - `Some((token, after))` arms, unless the same token is already
    ///   armed, in which case the existing deadline is kept as is.
    ///
    /// Returns `true` if anything changed. Room actors call this after
    /// every command with whatever the state machine currently wants.
    pub fn sync(&mut self, desired: Option<(T, Duration)>) -> bool {
        match desired {
            None => self.cancel().is_some(),
            Some((token, _)) if self.token() == Some(&token) => false,
            Some((token, after)) => {
                self.arm(token, after);
                true
            }
        }
    }

    /// Whether a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// The token of the pending deadline.
    pub fn token(&self) -> Option<&T> {
        self.armed.as_ref().map(|a| &a.token)
    }

    /// Time left until the pending deadline (zero if already due).
    pub fn remaining(&self) -> Option<Duration> {
        self.armed
            .as_ref()
            .map(|a| a.at.saturating_duration_since(Instant::now()))
    }

    /// Waits for the pending deadline, disarms, and returns its token.
    ///
    /// Pends forever while disarmed. Cancel-safe: if the future is dropped
    /// before the deadline, the timer stays armed.
    pub async fn wait(&mut self) -> T {
        let at = match &self.armed {
            Some(armed) => armed.at,
            None => return std::future::pending().await,
        };

        time::sleep_until(at).await;

        match self.armed.take() {
            Some(armed) => {
                trace!(token = ?armed.token, "deadline fired");
                armed.token
            }
            None => std::future::pending().await,
        }
    }
}
