//! Periodic cleanup of in-memory state.
//!
//! Login states expire after ten minutes, rate-limit windows go idle, and
//! refresh locks outlive their last waiter. None of that frees itself;
//! this task sweeps all three maps so memory tracks active users rather
//! than every user ever seen.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tunecast_core::login_state::LoginStateStore;
use tunecast_core::rate_limit::RateLimiter;

use crate::auth::refresher::TokenRefresher;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Run the sweeper until the token is cancelled.
pub async fn run(
    login_states: Arc<LoginStateStore>,
    rate_limiter: Arc<RateLimiter>,
    refresher: Arc<TokenRefresher>,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = SWEEP_INTERVAL.as_secs(), "State sweeper started");
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("State sweeper stopped");
                return;
            }
            _ = interval.tick() => {
                let expired_logins = login_states.purge_expired().await;
                let idle_limits = rate_limiter.sweep();
                let idle_locks = refresher.sweep_locks();
                if expired_logins > 0 || idle_limits > 0 || idle_locks > 0 {
                    tracing::debug!(
                        expired_logins,
                        idle_limits,
                        idle_locks,
                        "Swept in-memory state"
                    );
                }
            }
        }
    }
}
