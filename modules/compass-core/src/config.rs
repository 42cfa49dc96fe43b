use crate::error::{CompassError, Result};

pub const DEFAULT_BASE_URL: &str = "https://compass.scouts.org.uk";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compass-core)";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Portal connection settings, passed explicitly to the scrapers and client.
#[derive(Debug, Clone)]
pub struct CompassConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for CompassConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl CompassConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load from `COMPASS_*` environment variables (and `.env`).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::new(
            &std::env::var("COMPASS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        );
        if let Ok(user_agent) = std::env::var("COMPASS_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Ok(timeout) = std::env::var("COMPASS_TIMEOUT_SECS") {
            config.timeout_secs = timeout
                .parse()
                .map_err(|_| CompassError::Config(format!("COMPASS_TIMEOUT_SECS must be a number, got {timeout}")))?;
        }

        config.log();
        Ok(config)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn log(&self) {
        tracing::info!(
            base_url = %self.base_url,
            user_agent = %self.user_agent,
            timeout_secs = self.timeout_secs,
            "Compass config loaded"
        );
    }
}
