use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, StatusCode};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tunecast_api::auth::linking::LinkingFlow;
use tunecast_api::auth::refresher::{RefreshExchange, TokenRefresher};
use tunecast_api::auth::vault::CredentialVault;
use tunecast_api::config::AppConfig;
use tunecast_api::state::AppState;
use tunecast_api::{background, routes};
use tunecast_core::crypto::TokenCipher;
use tunecast_core::login_state::LoginStateStore;
use tunecast_core::rate_limit::RateLimiter;
use tunecast_spotify::{AccountsApi, PlayerApi};
use tunecast_telegram::types::BotCommand;
use tunecast_telegram::BotApi;

/// Update kinds the webhook subscribes to. Anything else Telegram could
/// send is noise this bot never handles.
const ALLOWED_UPDATES: &[&str] = &["message", "inline_query", "callback_query"];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tunecast_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = AppConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        environment = ?config.environment,
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = tunecast_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    tunecast_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    tunecast_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Services ---
    let cipher = TokenCipher::from_hex(&config.credential_key)
        .expect("CREDENTIAL_KEY must be 64 hex characters");
    let vault = Arc::new(CredentialVault::new(pool.clone(), cipher));

    let accounts = Arc::new(AccountsApi::new(
        config.spotify.client_id.clone(),
        config.spotify.client_secret.clone(),
        config.spotify_redirect_uri(),
    ));
    let exchange: Arc<dyn RefreshExchange> = accounts.clone();
    let refresher = Arc::new(TokenRefresher::new(Arc::clone(&vault), exchange));

    let login_states = Arc::new(LoginStateStore::new());
    let linking = Arc::new(LinkingFlow::new(
        Arc::clone(&accounts),
        Arc::clone(&login_states),
        Arc::clone(&vault),
    ));

    let rate_limiter = Arc::new(RateLimiter::new());
    let player = Arc::new(PlayerApi::new());

    // --- Telegram setup ---
    let bot = Arc::new(BotApi::new(&config.telegram.bot_token));

    let me = bot
        .get_me()
        .await
        .expect("Failed to reach the Telegram Bot API");
    let bot_username = me.username.expect("Bot account must have a username");
    tracing::info!(%bot_username, "Connected to the Telegram Bot API");

    bot.set_webhook(
        &config.webhook_url(),
        &config.telegram.webhook_secret,
        ALLOWED_UPDATES,
    )
    .await
    .expect("Failed to register the webhook");
    tracing::info!(url = %config.webhook_url(), "Webhook registered");

    bot.set_my_commands(&command_menu())
        .await
        .expect("Failed to publish the command menu");
    tracing::info!("Command menu published");

    // --- Background tasks ---
    let sweep_cancel = tokio_util::sync::CancellationToken::new();
    let sweeper_handle = tokio::spawn(background::sweeper::run(
        Arc::clone(&login_states),
        Arc::clone(&rate_limiter),
        Arc::clone(&refresher),
        sweep_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        vault,
        refresher,
        linking,
        rate_limiter,
        player,
        bot: Arc::clone(&bot),
        bot_username,
    };

    // --- Request ID header name ---
    let request_id_header = HeaderName::from_static("x-request-id");

    // --- Router ---
    let app = routes::router(&config)
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return 500.
        .layer(CatchPanicLayer::new())
        // Request timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // Shared state.
        .with_state(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // In development the public URL is a tunnel that dies with the
    // process, so the registrations are torn down. Production ones stay
    // across restarts.
    if config.environment.is_development() {
        if let Err(e) = bot.delete_webhook().await {
            tracing::warn!(error = %e, "Failed to remove the webhook registration");
        }
        if let Err(e) = bot.delete_my_commands().await {
            tracing::warn!(error = %e, "Failed to clear the command menu");
        }
        tracing::info!("Telegram registrations removed");
    }

    sweep_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweeper_handle).await;
    tracing::info!("State sweeper stopped");

    tracing::info!("Graceful shutdown complete");
}

/// The command menu published to Telegram at startup.
fn command_menu() -> Vec<BotCommand> {
    vec![
        BotCommand {
            command: "start".to_string(),
            description: "Start the bot".to_string(),
        },
        BotCommand {
            command: "help".to_string(),
            description: "How to use inline mode and login".to_string(),
        },
        BotCommand {
            command: "logout".to_string(),
            description: "Disconnect your Spotify account".to_string(),
        },
    ]
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
