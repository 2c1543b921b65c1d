use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub payment_provider: String,
    pub konnect_api_key: String,
    pub konnect_wallet_id: String,
    pub konnect_base_url: String,
    pub konnect_webhook_secret: String,
    pub currency: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "dar_dhiafa.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            payment_provider: env::var("PAYMENT_PROVIDER")
                .unwrap_or_else(|_| "simulated".to_string()),
            konnect_api_key: env::var("KONNECT_API_KEY").unwrap_or_default(),
            konnect_wallet_id: env::var("KONNECT_WALLET_ID").unwrap_or_default(),
            konnect_base_url: env::var("KONNECT_BASE_URL")
                .unwrap_or_else(|_| "https://api.konnect.network/api/v2".to_string()),
            konnect_webhook_secret: env::var("KONNECT_WEBHOOK_SECRET").unwrap_or_default(),
            currency: env::var("CURRENCY").unwrap_or_else(|_| "TND".to_string()),
        }
    }
}
