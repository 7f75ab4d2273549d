use std::env;

/// Default signature timestamp tolerance, in seconds. Matches the
/// 5-minute window payment providers recommend for replay mitigation.
const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Default retention for webhook event records. Providers retry for a
/// few days at most; anything older only serves forensics.
const DEFAULT_RETENTION_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Shared secret for webhook signature verification.
    pub webhook_secret: String,
    /// Maximum accepted age of a signed timestamp, in seconds.
    pub signature_tolerance_secs: i64,
    /// Event records older than this are purged. 0 = never purge.
    pub event_retention_days: i64,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("HOOKGATE_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "hookgate.db".to_string()),
            webhook_secret: env::var("WEBHOOK_SECRET").unwrap_or_default(),
            signature_tolerance_secs: env::var("SIGNATURE_TOLERANCE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TOLERANCE_SECS),
            event_retention_days: env::var("EVENT_RETENTION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETENTION_DAYS),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
