use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub email_from: String,
    pub resend_api_key: Option<String>,
    pub square_access_token: Option<String>,
    pub square_location_id: Option<String>,
    pub square_api_base: String,
    pub frontend_url: String,
    pub fallback_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:yardbook.db?mode=rwc".to_string()),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            email_from: env::var("EMAIL_FROM").unwrap_or_else(|_| "Yardbook <bookings@yardbook.local>".to_string()),
            resend_api_key: optional("RESEND_API_KEY"),
            square_access_token: optional("SQUARE_ACCESS_TOKEN"),
            square_location_id: optional("SQUARE_LOCATION_ID"),
            square_api_base: env::var("SQUARE_API_BASE").unwrap_or_else(|_| "https://connect.squareupsandbox.com".to_string()),
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            fallback_cache_ttl_secs: env::var("FALLBACK_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .expect("FALLBACK_CACHE_TTL_SECS must be a number"),
        }
    }
}

// Unset and empty both mean "feature disabled".
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
