use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Config {
    // Runtime
    pub environment: String,
    pub port: u16,

    // Storage
    pub database_path: String,

    // Admin API key; when unset the admin routes are open (local development)
    pub api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/site.db".to_string()),

            api_key: std::env::var("API_KEY").ok().filter(|v| !v.is_empty()),
        })
    }
}
