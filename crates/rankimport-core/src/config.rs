//! Layered configuration loading using figment.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. `/etc/rankimport.toml`
//! 3. `$XDG_CONFIG_HOME/rankimport/config.toml` (user-global)
//! 4. `./rankimport.toml` (working directory)
//! 5. An explicit file passed with `--config`
//! 6. Environment variables (`RANKIMPORT_*`, `__` separates sections)
//!
//! `RANKIMPORT_DATABASE__PATH` maps to `database.path`,
//! `RANKIMPORT_STORAGE__ACCESS_KEY_ID` to `storage.access_key_id`, and so on.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::enrich::{ExemptExchanges, DEFAULT_EXEMPT_EXCHANGES};
use crate::ConfigError;

const ENV_PREFIX: &str = "RANKIMPORT_";
const SYSTEM_CONFIG_PATH: &str = "/etc/rankimport.toml";
const LOCAL_CONFIG_PATH: &str = "rankimport.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RankImportConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub balance_sheet: BalanceSheetConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl RankImportConfig {
    /// Load from every layer, with `explicit` merged just below the
    /// environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(explicit).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the provider chain without extracting it.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let system = PathBuf::from(SYSTEM_CONFIG_PATH);
        if system.exists() {
            figment = figment.merge(Toml::file(system));
        }

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                figment = figment.merge(Toml::file(global));
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_PATH);
        if local.exists() {
            figment = figment.merge(Toml::file(local));
        }

        if let Some(path) = explicit {
            // Missing explicit files are an error, not a silent skip.
            figment = figment.merge(Toml::file_exact(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rankimport").join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: String::from("database.path"),
                reason: String::from("must not be empty"),
            });
        }
        if self.database.max_pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: String::from("database.max_pool_size"),
                reason: String::from("must be at least 1"),
            });
        }
        if self.import.file_prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: String::from("import.file_prefix"),
                reason: String::from("must not be empty"),
            });
        }
        Ok(())
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("rankimport.duckdb")
}

fn default_max_pool_size() -> usize {
    4
}

/// DuckDB file used as the relational sink.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_pool_size: default_max_pool_size(),
        }
    }
}

fn default_exempt_exchanges() -> Vec<String> {
    DEFAULT_EXEMPT_EXCHANGES
        .iter()
        .map(|code| (*code).to_owned())
        .collect()
}

fn default_file_prefix() -> String {
    String::from("zacks")
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ImportConfig {
    /// Maximum rows kept from an export; zero keeps every row.
    #[serde(default)]
    pub limit: usize,
    /// Exchanges whose unresolved tickers are not warned about.
    #[serde(default = "default_exempt_exchanges")]
    pub exempt_exchanges: Vec<String>,
    /// Prefix of the columnar file name, `{prefix}-{YYYYMMDD}.parquet`.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl ImportConfig {
    pub fn exempt(&self) -> ExemptExchanges {
        ExemptExchanges::new(self.exempt_exchanges.iter().cloned())
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            limit: 0,
            exempt_exchanges: default_exempt_exchanges(),
            file_prefix: default_file_prefix(),
        }
    }
}

fn default_lookback_days() -> u32 {
    90
}

fn default_max_assets() -> usize {
    25
}

fn default_balance_sheet_output() -> PathBuf {
    PathBuf::from("balance_sheet_info.parquet")
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BalanceSheetConfig {
    /// How far back a quarterly fundamentals row counts as recent.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    /// Targets returned per run; zero returns every candidate.
    #[serde(default = "default_max_assets")]
    pub max_assets: usize,
    #[serde(default = "default_balance_sheet_output")]
    pub output_path: PathBuf,
}

impl Default for BalanceSheetConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            max_assets: default_max_assets(),
            output_path: default_balance_sheet_output(),
        }
    }
}

fn default_bucket() -> String {
    String::from("zacks-investment")
}

fn default_region() -> String {
    String::from("us-west-004")
}

/// S3-compatible object storage that receives the columnar files.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Endpoint URL; empty means the provider default.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            endpoint: String::new(),
            region: default_region(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
        }
    }
}

impl StorageConfig {
    /// Credentials and a bucket are present.
    pub fn is_configured(&self) -> bool {
        !self.bucket.is_empty()
            && !self.access_key_id.is_empty()
            && !self.secret_access_key.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LogConfig {
    /// Emit log lines as JSON objects.
    #[serde(default)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RankImportConfig::default();
        assert_eq!(config.database.path, PathBuf::from("rankimport.duckdb"));
        assert_eq!(config.database.max_pool_size, 4);
        assert_eq!(config.import.limit, 0);
        assert_eq!(config.import.exempt_exchanges.len(), 8);
        assert_eq!(config.import.file_prefix, "zacks");
        assert_eq!(config.balance_sheet.lookback_days, 90);
        assert_eq!(config.balance_sheet.max_assets, 25);
        assert_eq!(config.storage.bucket, "zacks-investment");
        assert!(!config.storage.is_configured());
        assert!(!config.log.json);
    }

    #[test]
    fn env_overrides_nested_sections() {
        Jail::expect_with(|jail| {
            jail.set_env("RANKIMPORT_DATABASE__PATH", "/tmp/ranks.duckdb");
            jail.set_env("RANKIMPORT_IMPORT__LIMIT", "50");
            jail.set_env("RANKIMPORT_STORAGE__ACCESS_KEY_ID", "key");
            jail.set_env("RANKIMPORT_STORAGE__SECRET_ACCESS_KEY", "secret");

            let config = RankImportConfig::load(None).expect("config");
            assert_eq!(config.database.path, PathBuf::from("/tmp/ranks.duckdb"));
            assert_eq!(config.import.limit, 50);
            assert!(config.storage.is_configured());
            Ok(())
        });
    }

    #[test]
    fn local_file_is_read_and_env_wins() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "rankimport.toml",
                r#"
                [import]
                limit = 10
                file_prefix = "ranks"

                [balance_sheet]
                max_assets = 5
                "#,
            )?;
            jail.set_env("RANKIMPORT_IMPORT__LIMIT", "20");

            let config = RankImportConfig::load(None).expect("config");
            assert_eq!(config.import.limit, 20);
            assert_eq!(config.import.file_prefix, "ranks");
            assert_eq!(config.balance_sheet.max_assets, 5);
            assert_eq!(config.balance_sheet.lookback_days, 90);
            Ok(())
        });
    }

    #[test]
    fn explicit_file_overrides_local_file() {
        Jail::expect_with(|jail| {
            jail.create_file("rankimport.toml", "[database]\npath = \"local.duckdb\"\n")?;
            jail.create_file("other.toml", "[database]\npath = \"other.duckdb\"\n")?;

            let config = RankImportConfig::load(Some(Path::new("other.toml"))).expect("config");
            assert_eq!(config.database.path, PathBuf::from("other.duckdb"));
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        Jail::expect_with(|_jail| {
            let result = RankImportConfig::load(Some(Path::new("absent.toml")));
            assert!(matches!(result, Err(ConfigError::Figment(_))));
            Ok(())
        });
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("RANKIMPORT_DATABASE__MAX_POOL_SIZE", "0");
            let result = RankImportConfig::load(None);
            assert!(matches!(
                result,
                Err(ConfigError::InvalidValue { ref field, .. }) if field == "database.max_pool_size"
            ));
            Ok(())
        });
    }

    #[test]
    fn exempt_list_can_be_replaced() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "rankimport.toml",
                "[import]\nexempt_exchanges = [\"NYSE\"]\n",
            )?;
            let config = RankImportConfig::load(None).expect("config");
            let exempt = config.import.exempt();
            assert!(exempt.contains("NYSE"));
            assert!(!exempt.contains("OTC"));
            Ok(())
        });
    }
}
