//! Shared application state threaded through every handler.

use std::sync::Arc;

use tunecast_core::rate_limit::RateLimiter;
use tunecast_db::DbPool;
use tunecast_spotify::PlayerApi;
use tunecast_telegram::BotApi;

use crate::auth::linking::LinkingFlow;
use crate::auth::refresher::TokenRefresher;
use crate::auth::vault::CredentialVault;
use crate::config::AppConfig;

/// Cloned per request; every field is either a pool or an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<AppConfig>,
    pub vault: Arc<CredentialVault>,
    pub refresher: Arc<TokenRefresher>,
    pub linking: Arc<LinkingFlow>,
    pub rate_limiter: Arc<RateLimiter>,
    pub player: Arc<PlayerApi>,
    pub bot: Arc<BotApi>,
    /// The bot's Telegram username, resolved once at startup via `getMe`.
    /// Used for `t.me` deep links and user-facing help text.
    pub bot_username: String,
}
