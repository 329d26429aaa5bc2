use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::batch::PipelineSettings;
use crate::eligibility::Thresholds;
use crate::fetcher::BrowserSettings;

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

/// Top-level configuration for the service and the CLI.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub pipeline: PipelineConfig,
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
            pipeline: PipelineConfig::from_env()?,
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

/// Browser and batch controls, read from `GATE_*` variables.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub webdriver_url: String,
    pub headless: bool,
    pub thresholds: Thresholds,
    pub pacing: Duration,
    pub target_timeout: Duration,
    pub settle_delay: Duration,
    pub ready_wait: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let browser = BrowserSettings::default();
        let pipeline = PipelineSettings::default();
        Self {
            webdriver_url: browser.webdriver_url,
            headless: browser.headless,
            thresholds: pipeline.thresholds,
            pacing: pipeline.pacing,
            target_timeout: pipeline.target_timeout,
            settle_delay: browser.settle_delay,
            ready_wait: browser.ready_wait,
        }
    }
}

impl PipelineConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            webdriver_url: env::var("GATE_WEBDRIVER_URL").unwrap_or(defaults.webdriver_url),
            headless: parse_flag("GATE_HEADLESS", defaults.headless)?,
            thresholds: Thresholds {
                instagram: parse_number("GATE_THRESHOLD_INSTAGRAM", defaults.thresholds.instagram)?,
                threads: parse_number("GATE_THRESHOLD_THREADS", defaults.thresholds.threads)?,
                blog: parse_number("GATE_THRESHOLD_BLOG", defaults.thresholds.blog)?,
            },
            pacing: Duration::from_millis(parse_number(
                "GATE_PACING_MS",
                defaults.pacing.as_millis() as u64,
            )?),
            target_timeout: Duration::from_secs(parse_number(
                "GATE_TARGET_TIMEOUT_SECS",
                defaults.target_timeout.as_secs(),
            )?),
            settle_delay: Duration::from_millis(parse_number(
                "GATE_SETTLE_MS",
                defaults.settle_delay.as_millis() as u64,
            )?),
            ready_wait: Duration::from_secs(parse_number(
                "GATE_READY_WAIT_SECS",
                defaults.ready_wait.as_secs(),
            )?),
        })
    }

    pub fn browser_settings(&self) -> BrowserSettings {
        BrowserSettings {
            webdriver_url: self.webdriver_url.clone(),
            headless: self.headless,
            settle_delay: self.settle_delay,
            ready_wait: self.ready_wait,
            ..BrowserSettings::default()
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            thresholds: self.thresholds,
            pacing: self.pacing,
            target_timeout: self.target_timeout,
        }
    }
}

fn parse_number(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { name }),
        Err(_) => Ok(default),
    }
}

fn parse_flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidFlag { name }),
        },
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str },
    InvalidFlag { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name } => {
                write!(f, "{} must be a non-negative integer", name)
            }
            ConfigError::InvalidFlag { name } => write!(f, "{} must be true or false", name),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    const VARS: [&str; 13] = [
        "APP_ENV",
        "APP_HOST",
        "APP_PORT",
        "APP_LOG_LEVEL",
        "GATE_WEBDRIVER_URL",
        "GATE_HEADLESS",
        "GATE_THRESHOLD_INSTAGRAM",
        "GATE_THRESHOLD_THREADS",
        "GATE_THRESHOLD_BLOG",
        "GATE_PACING_MS",
        "GATE_TARGET_TIMEOUT_SECS",
        "GATE_SETTLE_MS",
        "GATE_READY_WAIT_SECS",
    ];

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in VARS {
            env::remove_var(name);
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
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert_eq!(config.pipeline.thresholds, Thresholds::default());
        assert_eq!(config.pipeline.pacing, Duration::from_secs(2));
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
    fn gate_overrides_flow_into_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("GATE_THRESHOLD_BLOG", "150");
        env::set_var("GATE_PACING_MS", "0");
        env::set_var("GATE_HEADLESS", "false");
        env::set_var("GATE_WEBDRIVER_URL", "http://chromedriver:4444");

        let config = AppConfig::load().expect("config loads");
        let pipeline = config.pipeline.pipeline_settings();
        assert_eq!(pipeline.thresholds.blog, 150);
        assert_eq!(pipeline.thresholds.instagram, 1_000);
        assert!(pipeline.pacing.is_zero());

        let browser = config.pipeline.browser_settings();
        assert!(!browser.headless);
        assert_eq!(browser.webdriver_url, "http://chromedriver:4444");
        assert_eq!(browser.locale, "ko-KR");
        reset_env();
    }

    #[test]
    fn rejects_malformed_threshold() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("GATE_THRESHOLD_THREADS", "five hundred");
        let err = AppConfig::load().expect_err("threshold must be numeric");
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                name: "GATE_THRESHOLD_THREADS"
            }
        ));
        reset_env();
    }
}
