use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::CommonResult;

const DEFAULT_CONFIG: &str = include_str!("default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub table_argument: TableArgumentConfig,
}

impl AppConfig {
    pub fn load() -> CommonResult<Self> {
        Ok(Figment::from(Toml::string(DEFAULT_CONFIG))
            .admerge(Env::prefixed("SAIL__").map(|p| p.as_str().replace("__", ".").into()))
            .extract()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableArgumentConfig {
    pub hash_partitions: usize,
    pub allow_multiple: bool,
}
