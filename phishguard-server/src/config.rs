//! Configuration module

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Optional path to a JSON detection-policy file; the built-in
    /// policy is used when unset
    pub policy_path: Option<String>,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PHISHGUARD_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),

            policy_path: env::var("PHISHGUARD_POLICY_PATH").ok(),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
