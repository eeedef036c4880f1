//! Per-user sliding-window rate limiting for bot traffic.
//!
//! Telegram happily delivers whatever a user can type, so each update kind
//! gets its own window: commands are cheap but spammable, inline queries
//! fan out to the upstream player API, and callback taps mutate playback
//! state. Limits are per user and per kind; hitting one kind does not
//! block the others.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::types::UserId;

/// Command messages: 30 per 30 seconds.
const COMMAND_LIMIT: usize = 30;
const COMMAND_WINDOW: Duration = Duration::from_secs(30);

/// Inline queries: 20 per 10 seconds.
const INLINE_LIMIT: usize = 20;
const INLINE_WINDOW: Duration = Duration::from_secs(10);

/// Callback queries: 5 per 10 seconds.
const CALLBACK_LIMIT: usize = 5;
const CALLBACK_WINDOW: Duration = Duration::from_secs(10);

/// The kind of inbound update being limited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitKind {
    Command,
    InlineQuery,
    CallbackQuery,
}

impl LimitKind {
    fn rule(self) -> (usize, Duration) {
        match self {
            LimitKind::Command => (COMMAND_LIMIT, COMMAND_WINDOW),
            LimitKind::InlineQuery => (INLINE_LIMIT, INLINE_WINDOW),
            LimitKind::CallbackQuery => (CALLBACK_LIMIT, CALLBACK_WINDOW),
        }
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after: Duration },
}

/// Sliding-window limiter over `(user, kind)` pairs.
///
/// Each admitted request records its instant; a request is admitted while
/// fewer than the kind's limit fall inside the window ending now. State is
/// in-memory and per-instance.
#[derive(Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<(UserId, LimitKind), VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit or reject a request, recording it when admitted.
    pub fn check(&self, user_id: UserId, kind: LimitKind) -> RateDecision {
        self.check_at(user_id, kind, Instant::now())
    }

    fn check_at(&self, user_id: UserId, kind: LimitKind, now: Instant) -> RateDecision {
        let (limit, window) = kind.rule();
        let mut windows = self.windows.lock().expect("rate limiter lock poisoned");
        let hits = windows.entry((user_id, kind)).or_default();

        prune(hits, window, now);

        if hits.len() < limit {
            hits.push_back(now);
            return RateDecision::Allowed;
        }

        let oldest = hits.front().copied().unwrap_or(now);
        RateDecision::Limited {
            retry_after: window.saturating_sub(now.duration_since(oldest)),
        }
    }

    /// Drop `(user, kind)` entries whose windows have fully drained.
    ///
    /// Intended to run from a periodic background task so idle users do
    /// not accumulate map entries forever. Returns how many entries were
    /// removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().expect("rate limiter lock poisoned");
        let before = windows.len();
        windows.retain(|&(_, kind), hits| {
            let (_, window) = kind.rule();
            prune(hits, window, now);
            !hits.is_empty()
        });
        before - windows.len()
    }

    /// Number of `(user, kind)` entries currently tracked.
    pub fn tracked_entries(&self) -> usize {
        self.windows.lock().expect("rate limiter lock poisoned").len()
    }
}

fn prune(hits: &mut VecDeque<Instant>, window: Duration, now: Instant) {
    while let Some(&oldest) = hits.front() {
        if now.duration_since(oldest) >= window {
            hits.pop_front();
        } else {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
