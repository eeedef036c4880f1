//! Application configuration loaded from environment variables.

/// Deployment environment, from `ENVIRONMENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value {
            "development" => Environment::Development,
            "production" => Environment::Production,
            "test" => Environment::Test,
            other => panic!("Unknown ENVIRONMENT '{other}' (expected development, production, or test)"),
        }
    }

    pub fn is_development(self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Spotify application settings.
///
/// The client secret stays inside this struct; nothing here derives
/// `Debug`, so a stray log line cannot spill it.
#[derive(Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Route path for the OAuth redirect target. Must match the redirect
    /// URI registered in the Spotify developer dashboard.
    pub callback_path: String,
}

/// Telegram bot settings.
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Route path where Telegram delivers updates.
    pub webhook_path: String,
    /// Shared secret registered with `setWebhook`; every delivery must
    /// echo it back in `X-Telegram-Bot-Api-Secret-Token`.
    pub webhook_secret: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    /// Externally reachable base URL of this service, without a trailing
    /// slash. Webhook and OAuth callback URLs are derived from it.
    pub public_url: String,
    /// Hex-encoded 256-bit key for sealing stored Spotify tokens.
    pub credential_key: String,
    pub request_timeout_secs: u64,
    pub spotify: SpotifyConfig,
    pub telegram: TelegramConfig,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// | Env Var | Default |
    /// |---------|---------|
    /// | `ENVIRONMENT` | `development` |
    /// | `HOST` | `0.0.0.0` |
    /// | `PORT` | `3000` |
    /// | `PUBLIC_URL` | (required) |
    /// | `CREDENTIAL_KEY` | (required) |
    /// | `REQUEST_TIMEOUT_SECS` | `30` |
    /// | `TELEGRAM_BOT_TOKEN` | (required) |
    /// | `TELEGRAM_WEBHOOK_SECRET` | (required) |
    /// | `TELEGRAM_WEBHOOK_PATH` | `/telegram/webhook` |
    /// | `SPOTIFY_CLIENT_ID` | (required) |
    /// | `SPOTIFY_CLIENT_SECRET` | (required) |
    /// | `SPOTIFY_CALLBACK_PATH` | `/spotify/callback` |
    ///
    /// Panics when a required variable is missing or a value fails to
    /// parse, so misconfiguration is caught at startup.
    pub fn from_env() -> Self {
        let environment = std::env::var("ENVIRONMENT")
            .map(|v| Environment::parse(&v))
            .unwrap_or(Environment::Development);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .expect("PORT must be a valid port number");

        let public_url = std::env::var("PUBLIC_URL")
            .expect("PUBLIC_URL must be set")
            .trim_end_matches('/')
            .to_string();

        let credential_key =
            std::env::var("CREDENTIAL_KEY").expect("CREDENTIAL_KEY must be set");

        let request_timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a number");

        let spotify = SpotifyConfig {
            client_id: std::env::var("SPOTIFY_CLIENT_ID").expect("SPOTIFY_CLIENT_ID must be set"),
            client_secret: std::env::var("SPOTIFY_CLIENT_SECRET")
                .expect("SPOTIFY_CLIENT_SECRET must be set"),
            callback_path: route_path("SPOTIFY_CALLBACK_PATH", "/spotify/callback"),
        };

        let telegram = TelegramConfig {
            bot_token: std::env::var("TELEGRAM_BOT_TOKEN")
                .expect("TELEGRAM_BOT_TOKEN must be set"),
            webhook_path: route_path("TELEGRAM_WEBHOOK_PATH", "/telegram/webhook"),
            webhook_secret: std::env::var("TELEGRAM_WEBHOOK_SECRET")
                .expect("TELEGRAM_WEBHOOK_SECRET must be set"),
        };

        Self {
            environment,
            host,
            port,
            public_url,
            credential_key,
            request_timeout_secs,
            spotify,
            telegram,
        }
    }

    /// Absolute URL Telegram posts updates to.
    pub fn webhook_url(&self) -> String {
        format!("{}{}", self.public_url, self.telegram.webhook_path)
    }

    /// Absolute redirect URI sent to Spotify during authorization.
    pub fn spotify_redirect_uri(&self) -> String {
        format!("{}{}", self.public_url, self.spotify.callback_path)
    }
}

/// Read a route path variable, falling back to `default`.
fn route_path(var: &str, default: &str) -> String {
    let path = std::env::var(var).unwrap_or_else(|_| default.to_string());
    assert!(path.starts_with('/'), "{var} must start with '/'");
    path
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
