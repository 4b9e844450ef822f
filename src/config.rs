use std::env;

/// Merchant credentials and identifiers shared with the Click gateway.
///
/// Passed explicitly to the signature verifier, validator, and gateway
/// client instead of being read from ambient state, so tests can supply
/// fixed vectors.
#[derive(Debug, Clone)]
pub struct ClickConfig {
    /// Service identifier assigned by the gateway; echoed in every callback.
    pub service_id: String,
    /// Merchant API user id (outbound Auth header).
    pub merchant_user_id: String,
    /// Shared secret known only to merchant and gateway.
    pub secret_key: String,
    /// Base URL of the Click merchant API.
    pub api_base_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub click: ClickConfig,
    /// How often the background reconciliation sweep runs.
    pub sync_interval_secs: u64,
    /// Age after which a PENDING payment is eligible for reconciliation.
    pub sync_stale_after_secs: i64,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("CLICKGATE_ENV")
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
                .unwrap_or_else(|_| "clickgate.db".to_string()),
            click: ClickConfig {
                service_id: env::var("CLICK_SERVICE_ID").unwrap_or_default(),
                merchant_user_id: env::var("CLICK_MERCHANT_USER_ID").unwrap_or_default(),
                secret_key: env::var("CLICK_SECRET_KEY").unwrap_or_default(),
                api_base_url: env::var("CLICK_API_BASE_URL")
                    .unwrap_or_else(|_| "https://api.click.uz/v2/merchant".to_string()),
            },
            sync_interval_secs: env::var("SYNC_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            sync_stale_after_secs: env::var("SYNC_STALE_AFTER_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(900),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
