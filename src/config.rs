use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

pub mod gateway;

pub use gateway::{GatewayConfig, Region};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" | "" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'plain' or 'json', got '{}'", other),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub public_base_url: String,
    pub database_url: Option<String>,
    pub log_format: LogFormat,
    pub gateway: GatewayConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            public_base_url: env::var("PUBLIC_BASE_URL")?,
            database_url: env::var("DATABASE_URL").ok(),
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "plain".to_string())
                .parse()?,
            gateway: GatewayConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Plain".parse::<LogFormat>().unwrap(), LogFormat::Plain);
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
