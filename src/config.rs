use crate::storage::resolve_data_path;
use std::{env, path::PathBuf, str::FromStr, time::Duration};
use tracing::warn;

pub const CHART_WIDTH: u32 = 600;
pub const CHART_HEIGHT: u32 = 260;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub refresh_interval: Duration,
    pub carousel_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, std::io::Error> {
        Ok(Self {
            port: env_or("PORT", 8080),
            data_path: resolve_data_path()?,
            refresh_interval: Duration::from_secs(env_or("REFRESH_INTERVAL_SECS", 60)),
            carousel_interval: Duration::from_secs(env_or("CAROUSEL_INTERVAL_SECS", 3)),
        })
    }
}

fn env_or<T: FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(value) => match value.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(var = name, value = %value, "ignoring unparseable setting");
                default
            }
        },
        Err(_) => default,
    }
}
