use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::survey::intake::MissingItemPolicy;
use crate::survey::summary::SummaryOptions;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub store: Option<StoreConfig>,
    pub survey: SurveyConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            store: StoreConfig::from_env()?,
            survey: SurveyConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Location and credentials of the hosted record store.
#[derive(Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: String,
    pub responses_table: String,
    pub questions_table: String,
}

impl StoreConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let base_url = match env::var("CSAT_STORE_URL") {
            Ok(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
            _ => return Ok(None),
        };

        let api_key = env::var("CSAT_STORE_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingStoreKey)?;

        Ok(Some(Self {
            base_url,
            api_key,
            responses_table: env::var("CSAT_RESPONSES_TABLE")
                .unwrap_or_else(|_| "survey_responses".to_string()),
            questions_table: env::var("CSAT_QUESTIONS_TABLE")
                .unwrap_or_else(|_| "questions".to_string()),
        }))
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base_url", &self.base_url)
            .field("responses_table", &self.responses_table)
            .field("questions_table", &self.questions_table)
            .finish_non_exhaustive()
    }
}

/// Survey scoring and intake knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyConfig {
    pub expected_population: Option<u32>,
    pub recent_limit: usize,
    pub missing_item_policy: MissingItemPolicy,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            expected_population: None,
            recent_limit: 10,
            missing_item_policy: MissingItemPolicy::Reject,
        }
    }
}

impl SurveyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let expected_population = match env::var("CSAT_EXPECTED_POPULATION") {
            Ok(raw) if !raw.trim().is_empty() => {
                let value = raw
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| ConfigError::InvalidExpectedPopulation)?;
                if value == 0 {
                    return Err(ConfigError::InvalidExpectedPopulation);
                }
                Some(value)
            }
            _ => defaults.expected_population,
        };

        let recent_limit = match env::var("CSAT_RECENT_LIMIT") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidRecentLimit)?,
            Err(_) => defaults.recent_limit,
        };

        let missing_item_policy = match env::var("CSAT_MISSING_ITEM_POLICY") {
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "reject" => MissingItemPolicy::Reject,
                "neutral" => MissingItemPolicy::Neutral,
                _ => return Err(ConfigError::InvalidMissingItemPolicy(raw)),
            },
            Err(_) => defaults.missing_item_policy,
        };

        Ok(Self {
            expected_population,
            recent_limit,
            missing_item_policy,
        })
    }

    pub fn summary_options(&self) -> SummaryOptions {
        SummaryOptions {
            expected_population: self.expected_population,
            recent_limit: self.recent_limit,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    MissingStoreKey,
    InvalidExpectedPopulation,
    InvalidRecentLimit,
    InvalidMissingItemPolicy(String),
    MissingAdminPassword,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::MissingStoreKey => {
                write!(f, "CSAT_STORE_KEY is required when CSAT_STORE_URL is set")
            }
            ConfigError::InvalidExpectedPopulation => {
                write!(f, "CSAT_EXPECTED_POPULATION must be a positive integer")
            }
            ConfigError::InvalidRecentLimit => {
                write!(f, "CSAT_RECENT_LIMIT must be a non-negative integer")
            }
            ConfigError::InvalidMissingItemPolicy(value) => write!(
                f,
                "CSAT_MISSING_ITEM_POLICY must be 'reject' or 'neutral' (got '{value}')"
            ),
            ConfigError::MissingAdminPassword => {
                write!(f, "CSAT_ADMIN_PASSWORD is required for administrator commands")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "CSAT_STORE_URL",
            "CSAT_STORE_KEY",
            "CSAT_RESPONSES_TABLE",
            "CSAT_QUESTIONS_TABLE",
            "CSAT_EXPECTED_POPULATION",
            "CSAT_RECENT_LIMIT",
            "CSAT_MISSING_ITEM_POLICY",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.store.is_none());
        assert_eq!(config.survey, SurveyConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn store_url_requires_a_key() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("CSAT_STORE_URL", "https://example.supabase.co/");
        let err = AppConfig::load().expect_err("missing key rejected");
        assert!(matches!(err, ConfigError::MissingStoreKey));

        env::set_var("CSAT_STORE_KEY", "anon-key");
        let config = AppConfig::load().expect("config loads");
        let store = config.store.expect("store configured");
        assert_eq!(store.base_url, "https://example.supabase.co");
        assert_eq!(store.responses_table, "survey_responses");
        assert!(!format!("{store:?}").contains("anon-key"));
        reset_env();
    }

    #[test]
    fn survey_settings_are_parsed() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("CSAT_EXPECTED_POPULATION", "250");
        env::set_var("CSAT_RECENT_LIMIT", "5");
        env::set_var("CSAT_MISSING_ITEM_POLICY", "Neutral");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.survey.expected_population, Some(250));
        assert_eq!(config.survey.recent_limit, 5);
        assert_eq!(config.survey.missing_item_policy, MissingItemPolicy::Neutral);

        env::set_var("CSAT_EXPECTED_POPULATION", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidExpectedPopulation)
        ));
        reset_env();
    }
}
