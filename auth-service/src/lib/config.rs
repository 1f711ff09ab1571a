use std::collections::HashMap;
use std::env;

use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

/// Top-level sections that environment variables may override.
const SECTIONS: [&str; 5] = ["database", "server", "jwt", "smtp", "app"];

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub app: AppConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Deadline applied to every store operation.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    pub backend_url: String,
    /// Base of the links placed in verification emails.
    pub frontend_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: String,
    #[serde(default = "default_refresh_expires_in")]
    pub refresh_expires_in: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub app_name: String,
    #[serde(default = "default_starttls")]
    pub starttls: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
        }
    }
}

impl AppConfig {
    /// Development mode exposes internal error details in responses.
    pub fn is_development(&self) -> bool {
        matches!(
            self.environment.to_ascii_lowercase().as_str(),
            "development" | "dev"
        )
    }
}

impl JwtConfig {
    pub fn access_ttl(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.expires_in)
    }

    pub fn refresh_ttl(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.refresh_expires_in)
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, DATABASE__URL, SMTP__HOST, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    ///
    /// Token lifetimes and the signing secret are checked here so a bad
    /// value stops the service at startup.
    pub fn load() -> Result<Self, ConfigError> {
        let variables = env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        Self::load_with(variables)
    }

    /// Same as [`Config::load`] with `variables` standing in for the process
    /// environment. Only variables under a known section are read.
    pub fn load_with(variables: HashMap<String, String>) -> Result<Self, ConfigError> {
        let run_mode = variables
            .get("RUN_MODE")
            .cloned()
            .unwrap_or_else(|| "development".to_string());

        let overrides: HashMap<String, String> = variables
            .into_iter()
            .filter(|(key, _)| {
                key.split_once("__").is_some_and(|(section, rest)| {
                    !rest.is_empty() && SECTIONS.iter().any(|s| s.eq_ignore_ascii_case(section))
                })
            })
            .collect();

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(
                Environment::default()
                    .separator("__")
                    .source(Some(overrides)),
            )
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt.secret must be set".to_string()));
        }
        self.jwt.access_ttl()?;
        self.jwt.refresh_ttl()?;
        Ok(())
    }
}

/// Parse durations such as `30d`, `12h`, `45m`, `90s`, `250ms` or `1h30m`.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::Message(format!("invalid duration: {:?}", input));

    let input = input.trim();
    if input.is_empty() {
        return Err(invalid());
    }

    let mut total = Duration::zero();
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return Err(invalid());
        }
        let amount: i64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let unit_len = rest.chars().take_while(|c| c.is_ascii_alphabetic()).count();
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let part = match unit {
            "d" => Duration::try_days(amount),
            "h" => Duration::try_hours(amount),
            "m" => Duration::try_minutes(amount),
            "s" => Duration::try_seconds(amount),
            "ms" => Duration::try_milliseconds(amount),
            _ => None,
        }
        .ok_or_else(invalid)?;

        total = total.checked_add(&part).ok_or_else(invalid)?;
    }

    Ok(total)
}

fn default_max_connections() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_issuer() -> String {
    "talentspal".to_string()
}

fn default_expires_in() -> String {
    "1h".to_string()
}

fn default_refresh_expires_in() -> String {
    "30d".to_string()
}

fn default_starttls() -> bool {
    true
}

fn default_environment() -> String {
    "production".to_string()
}
