/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Base URL of the Open-Meteo API (overridable so tests can point at a mock).
    pub open_meteo_base_url: String,
    /// Outbound request budget for the shared rate limiter.
    pub requests_per_minute: u32,
    /// Wall-clock budget in seconds used to derive the per-segment sample count.
    pub sample_budget_secs: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
            open_meteo_base_url: std::env::var("OPEN_METEO_BASE_URL")
                .unwrap_or_else(|_| "https://api.open-meteo.com".to_string()),
            requests_per_minute: std::env::var("REQUESTS_PER_MINUTE")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("REQUESTS_PER_MINUTE must be a valid u32"),
            sample_budget_secs: std::env::var("SAMPLE_BUDGET_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("SAMPLE_BUDGET_SECS must be a valid u32"),
        }
    }
}
