use std::env;

/// Allowed CORS origins for the dashboard and mobile clients.
///
/// `ALLOWED_ORIGINS` is a comma-separated list; unset, it admits the
/// local dashboard dev servers.
#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn from_env() -> Self {
        let raw = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://localhost:3001".to_string());

        Self {
            allowed_origins: raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_local_dashboards() {
        // Only meaningful when ALLOWED_ORIGINS is unset in the test env.
        if env::var("ALLOWED_ORIGINS").is_err() {
            let config = CorsConfig::from_env();
            assert_eq!(config.allowed_origins.len(), 2);
            assert!(config.allowed_origins[0].starts_with("http://localhost"));
        }
    }
}
