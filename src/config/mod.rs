mod api;
mod basic;

pub use api::{CorsConfig, PaginationConfig};
pub use basic::BasicConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// List/search paging limits (see `pagination` table in config.toml).
    #[serde(default)]
    pub pagination: PaginationConfig,

    #[serde(default)]
    pub cors: CorsConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "CURATION_";

impl Config {
    /// Builds a Figment that merges defaults, `config.toml` and `CURATION_*` env vars.
    ///
    /// Nested keys use a double underscore: `CURATION_BASIC__LISTEN_PORT=9000`.
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads configuration; panics on malformed input since nothing can run without it.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml + env): {err}")
        })
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_optional_toml);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_extract_without_file() {
        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .extract()
            .expect("defaults extract");
        assert_eq!(cfg.basic.listen_port, 8080);
        assert_eq!(cfg.pagination.default_size, 20);
        assert!(cfg.cors.allowed_origins.is_empty());
    }

    #[test]
    fn toml_overrides_defaults() {
        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [basic]
                listen_port = 9001
                database_url = "sqlite::memory:"

                [pagination]
                max_size = 50
                "#,
            ))
            .extract()
            .expect("toml extract");
        assert_eq!(cfg.basic.listen_port, 9001);
        assert_eq!(cfg.basic.database_url, "sqlite::memory:");
        assert_eq!(cfg.pagination.max_size, 50);
        assert_eq!(cfg.pagination.default_size, 20);
    }
}
