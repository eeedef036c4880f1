#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, HeaderName, Method, Request, Response, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use tunecast_api::auth::linking::LinkingFlow;
use tunecast_api::auth::refresher::{RefreshExchange, TokenRefresher};
use tunecast_api::auth::vault::CredentialVault;
use tunecast_api::config::{AppConfig, Environment, SpotifyConfig, TelegramConfig};
use tunecast_api::routes;
use tunecast_api::state::AppState;
use tunecast_core::crypto::TokenCipher;
use tunecast_core::login_state::LoginStateStore;
use tunecast_core::rate_limit::RateLimiter;
use tunecast_spotify::{AccountsApi, PlayerApi};
use tunecast_telegram::BotApi;

pub const TEST_CIPHER_KEY: &str =
    "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
pub const TEST_WEBHOOK_SECRET: &str = "test-webhook-secret";
pub const TEST_BOT_TOKEN: &str = "000000:test-bot-token";
pub const TEST_BOT_USERNAME: &str = "tunecast_test_bot";

/// Loopback port nothing listens on, so a test that should not reach an
/// upstream fails fast if it does.
pub const UNROUTABLE: &str = "http://127.0.0.1:9";

/// Base URLs the app's upstream clients are pointed at. Defaults are
/// unroutable; tests spawn mock servers for the upstreams they exercise.
pub struct TestEndpoints {
    pub bot_base_url: String,
    pub player_base_url: String,
    pub accounts_base_url: String,
}

impl Default for TestEndpoints {
    fn default() -> Self {
        Self {
            bot_base_url: UNROUTABLE.to_string(),
            player_base_url: UNROUTABLE.to_string(),
            accounts_base_url: UNROUTABLE.to_string(),
        }
    }
}

/// Build a test `AppConfig` with safe defaults.
pub fn test_config() -> AppConfig {
    AppConfig {
        environment: Environment::Test,
        host: "127.0.0.1".to_string(),
        port: 0,
        public_url: "http://localhost:3000".to_string(),
        credential_key: TEST_CIPHER_KEY.to_string(),
        request_timeout_secs: 30,
        spotify: SpotifyConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            callback_path: "/spotify/callback".to_string(),
        },
        telegram: TelegramConfig {
            bot_token: TEST_BOT_TOKEN.to_string(),
            webhook_path: "/telegram/webhook".to_string(),
            webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
        },
    }
}

/// Build the application state with upstream clients pointed at the given
/// endpoints.
pub fn test_state(pool: PgPool, endpoints: &TestEndpoints) -> AppState {
    let config = test_config();

    let cipher = TokenCipher::from_hex(TEST_CIPHER_KEY).expect("test key is valid hex");
    let vault = Arc::new(CredentialVault::new(pool.clone(), cipher));

    let accounts = Arc::new(
        AccountsApi::new(
            config.spotify.client_id.clone(),
            config.spotify.client_secret.clone(),
            config.spotify_redirect_uri(),
        )
        .with_base_url(endpoints.accounts_base_url.clone()),
    );
    let exchange: Arc<dyn RefreshExchange> = accounts.clone();
    let refresher = Arc::new(TokenRefresher::new(Arc::clone(&vault), exchange));

    let login_states = Arc::new(LoginStateStore::new());
    let linking = Arc::new(LinkingFlow::new(
        Arc::clone(&accounts),
        login_states,
        Arc::clone(&vault),
    ));

    AppState {
        pool,
        config: Arc::new(config),
        vault,
        refresher,
        linking,
        rate_limiter: Arc::new(RateLimiter::new()),
        player: Arc::new(PlayerApi::new().with_base_url(endpoints.player_base_url.clone())),
        bot: Arc::new(BotApi::new(TEST_BOT_TOKEN).with_base_url(endpoints.bot_base_url.clone())),
        bot_username: TEST_BOT_USERNAME.to_string(),
    }
}

/// Build the full application router with all middleware layers.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_app_with(pool: PgPool, endpoints: &TestEndpoints) -> Router {
    let state = test_state(pool, endpoints);
    let config = Arc::clone(&state.config);
    let request_id_header = HeaderName::from_static("x-request-id");

    routes::router(&config)
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .with_state(state)
}

/// Build the app with every upstream unroutable.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, &TestEndpoints::default())
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get_request(app: Router, path: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("request builds");
    app.oneshot(request).await.expect("request succeeds")
}

/// POST an update to the webhook path, optionally with a secret header.
pub async fn post_update(app: Router, secret: Option<&str>, update: &Value) -> Response<Body> {
    post_webhook_body(app, secret, update.to_string()).await
}

/// POST a raw body to the webhook path.
pub async fn post_webhook_body(
    app: Router,
    secret: Option<&str>,
    body: String,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/telegram/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(secret) = secret {
        builder = builder.header("x-telegram-bot-api-secret-token", secret);
    }
    let request = builder.body(Body::from(body)).expect("request builds");
    app.oneshot(request).await.expect("request succeeds")
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("body is JSON")
}

// ---------------------------------------------------------------------------
// Update fixtures
// ---------------------------------------------------------------------------

pub fn message_update(user_id: i64, text: &str) -> Value {
    json!({
        "update_id": 1,
        "message": {
            "message_id": 100,
            "from": { "id": user_id, "is_bot": false, "first_name": "Test" },
            "chat": { "id": user_id },
            "text": text
        }
    })
}

pub fn inline_query_update(user_id: i64) -> Value {
    json!({
        "update_id": 2,
        "inline_query": {
            "id": "inline-query-1",
            "from": { "id": user_id, "is_bot": false, "first_name": "Test" },
            "query": ""
        }
    })
}

pub fn callback_query_update(user_id: i64, data: &str) -> Value {
    json!({
        "update_id": 3,
        "callback_query": {
            "id": "callback-query-1",
            "from": { "id": user_id, "is_bot": false, "first_name": "Test" },
            "data": data
        }
    })
}

/// A currently-playing payload in the player API's wire shape.
pub fn playing_track_fixture() -> Value {
    json!({
        "is_playing": true,
        "currently_playing_type": "track",
        "item": {
            "id": "4uLU6hMCjMI75M1A2tKUQC",
            "name": "Never Gonna Give You Up",
            "artists": [{ "name": "Rick Astley" }],
            "external_urls": {
                "spotify": "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"
            },
            "album": {
                "name": "Whenever You Need Somebody",
                "images": [
                    { "url": "https://i.scdn.co/image/large", "width": 640, "height": 640 },
                    { "url": "https://i.scdn.co/image/small", "width": 64, "height": 64 }
                ]
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Database helpers
// ---------------------------------------------------------------------------

/// Store a linked credential directly, bypassing the OAuth flow. The
/// stored access token is fresh for an hour.
pub async fn link_user(pool: &PgPool, user_id: i64, access_token: &str) {
    link_user_expiring(pool, user_id, access_token, Utc::now() + chrono::Duration::hours(1)).await;
}

/// Store a linked credential with an explicit expiry.
pub async fn link_user_expiring(
    pool: &PgPool,
    user_id: i64,
    access_token: &str,
    expires_at: chrono::DateTime<Utc>,
) {
    let cipher = TokenCipher::from_hex(TEST_CIPHER_KEY).expect("test key is valid hex");
    let vault = CredentialVault::new(pool.clone(), cipher);
    vault
        .store(
            user_id,
            access_token,
            "stored-refresh-token",
            expires_at,
            "user-read-currently-playing",
        )
        .await
        .expect("credential stores");
}

// ---------------------------------------------------------------------------
// Mock upstream servers
// ---------------------------------------------------------------------------

/// Calls recorded by the mock Bot API: (method name, request payload).
pub type RecordedCalls = Arc<tokio::sync::Mutex<Vec<(String, Value)>>>;

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port binds");
    let addr = listener.local_addr().expect("listener has an address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server runs");
    });
    format!("http://{addr}")
}

/// Spawn a mock Bot API that records every method call and answers
/// `{"ok": true, "result": true}`.
pub async fn spawn_mock_bot_api() -> (String, RecordedCalls) {
    let recorded: RecordedCalls = Arc::new(tokio::sync::Mutex::new(Vec::new()));

    async fn record(
        State(recorded): State<RecordedCalls>,
        Path(rest): Path<String>,
        Json(payload): Json<Value>,
    ) -> Json<Value> {
        let method = rest.rsplit('/').next().unwrap_or(&rest).to_string();
        recorded.lock().await.push((method, payload));
        Json(json!({ "ok": true, "result": true }))
    }

    let app = Router::new()
        .route("/{*rest}", post(record))
        .with_state(Arc::clone(&recorded));

    (spawn_server(app).await, recorded)
}

/// Spawn a mock player API. `playing` is returned from the
/// currently-playing endpoint (`None` means 204); queue adds always
/// succeed.
pub async fn spawn_mock_player(playing: Option<Value>) -> String {
    let currently_playing = move || {
        let playing = playing.clone();
        async move {
            match playing {
                Some(body) => (StatusCode::OK, Json(body)).into_response(),
                None => StatusCode::NO_CONTENT.into_response(),
            }
        }
    };

    let app = Router::new()
        .route("/me/player/currently-playing", get(currently_playing))
        .route(
            "/me/player/queue",
            post(|| async { StatusCode::NO_CONTENT }),
        );

    spawn_server(app).await
}

/// Spawn a mock accounts service whose token endpoint always returns the
/// given body.
pub async fn spawn_mock_accounts(token_response: Value) -> String {
    let token = move || {
        let body = token_response.clone();
        async move { Json(body) }
    };

    let app = Router::new().route("/api/token", post(token));
    spawn_server(app).await
}

/// Spawn a mock accounts service whose token endpoint always fails with
/// the given status and error body.
pub async fn spawn_mock_accounts_rejecting(status: StatusCode, error_body: Value) -> String {
    let token = move || {
        let body = error_body.clone();
        async move { (status, Json(body)).into_response() }
    };

    let app = Router::new().route("/api/token", post(token));
    spawn_server(app).await
}

/// The payload of the first recorded call to `method`, if any.
pub fn recorded_call(calls: &[(String, Value)], method: &str) -> Option<Value> {
    calls
        .iter()
        .find(|(name, _)| name == method)
        .map(|(_, payload)| payload.clone())
}
