use std::{env, error::Error};

use crate::domain::StatisticsChannels;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub database_max_connections: u32,
    pub cors_allowed_origins: Vec<String>,
    pub statistics_channels: StatisticsChannels,
    pub run_migrations: bool,
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_CORS_ALLOWED_ORIGINS: [&str; 1] = ["http://localhost:5051"];

impl AppConfig {
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        let database_url = env::var("DATABASE_URL")?;
        let bind_addr = match env::var("BIND_ADDR") {
            Ok(raw) => raw,
            Err(env::VarError::NotPresent) => DEFAULT_BIND_ADDR.to_owned(),
            Err(err) => return Err(Box::new(err)),
        };
        let database_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse::<u32>()?,
            Err(env::VarError::NotPresent) => DEFAULT_MAX_CONNECTIONS,
            Err(err) => return Err(Box::new(err)),
        };
        let cors_allowed_origins = match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
            Err(env::VarError::NotPresent) => DEFAULT_CORS_ALLOWED_ORIGINS
                .iter()
                .map(|value| (*value).to_owned())
                .collect(),
            Err(err) => return Err(Box::new(err)),
        };
        let statistics_channels = match env::var("STATISTICS_CHANNELS") {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(env::VarError::NotPresent) => StatisticsChannels::default(),
            Err(err) => return Err(Box::new(err)),
        };
        let run_migrations = match env::var("RUN_MIGRATIONS") {
            Ok(raw) => raw.trim().parse::<bool>()?,
            Err(env::VarError::NotPresent) => false,
            Err(err) => return Err(Box::new(err)),
        };

        Ok(Self {
            database_url,
            bind_addr,
            database_max_connections,
            cors_allowed_origins,
            statistics_channels,
            run_migrations,
        })
    }
}
