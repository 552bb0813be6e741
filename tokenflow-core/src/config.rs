// tokenflow-core/src/config.rs
// Layered settings: built-in defaults < config file < TOKENFLOW__* environment

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokenflow_common::analytics::SupplyDefinition;
use tokenflow_common::data::NormalizerConfig;

pub const DEFAULT_BASE_URL: &str =
    "https://xcap-mainnet.explorer.xcap.network/api/v2/token-transfers";
pub const ENV_PREFIX: &str = "TOKENFLOW";

#[derive(Debug, Deserialize, Clone)]
pub struct SourceSettings {
    pub base_url: String,
    pub max_pages: u32,
    pub page_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub workbook_path: String,
    pub records_sheet: String,
}

impl SourceSettings {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    pub ttl_seconds: u64,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NormalizeSettings {
    pub default_decimals: u8,
    pub dedup_by_hash: bool,
}

impl NormalizeSettings {
    pub fn normalizer_config(&self) -> NormalizerConfig {
        NormalizerConfig {
            default_decimals: self.default_decimals,
            dedup_by_hash: self.dedup_by_hash,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsSettings {
    pub percentile: f64,
    pub rolling_window: usize,
    pub rolling_min_periods: usize,
    pub top_n: usize,
    pub histogram_bins: usize,
    pub supply_definition: SupplyDefinition,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            percentile: 0.95,
            rolling_window: 7,
            rolling_min_periods: 1,
            top_n: 10,
            histogram_bins: 50,
            supply_definition: SupplyDefinition::NetMintBurn,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub source: SourceSettings,
    pub cache: CacheSettings,
    pub normalize: NormalizeSettings,
    pub analytics: AnalyticsSettings,
}

impl Settings {
    /// Defaults, then an optional `config.{toml,json,yaml}` in the working
    /// directory, then environment overrides.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Like `new`, but reads `path` (required) instead of `config.*`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load(Some(path.as_ref()))
    }

    fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name("config").required(false),
        };

        let s = Config::builder()
            .set_default("source.base_url", DEFAULT_BASE_URL)?
            .set_default("source.max_pages", 50)?
            .set_default("source.page_delay_ms", 300)?
            .set_default("source.request_timeout_secs", 10)?
            .set_default("source.workbook_path", "data/token_data.xlsx")?
            .set_default("source.records_sheet", "Total_cleaned_records")?
            .set_default("cache.ttl_seconds", 8 * 60 * 60)?
            .set_default("normalize.default_decimals", 18)?
            .set_default("normalize.dedup_by_hash", true)?
            .set_default("analytics.percentile", 0.95)?
            .set_default("analytics.rolling_window", 7)?
            .set_default("analytics.rolling_min_periods", 1)?
            .set_default("analytics.top_n", 10)?
            .set_default("analytics.histogram_bins", 50)?
            .set_default("analytics.supply_definition", "net_mint_burn")?
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.max_pages == 0 {
            return Err(ConfigError::Message(
                "source.max_pages must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.analytics.percentile) {
            return Err(ConfigError::Message(format!(
                "analytics.percentile {} outside [0, 1]",
                self.analytics.percentile
            )));
        }
        if self.analytics.rolling_window == 0 {
            return Err(ConfigError::Message(
                "analytics.rolling_window must be at least 1".into(),
            ));
        }
        if self.analytics.rolling_min_periods > self.analytics.rolling_window {
            return Err(ConfigError::Message(format!(
                "analytics.rolling_min_periods {} exceeds rolling_window {}",
                self.analytics.rolling_min_periods, self.analytics.rolling_window
            )));
        }
        if self.analytics.histogram_bins == 0 {
            return Err(ConfigError::Message(
                "analytics.histogram_bins must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_from_empty_file() {
        let file = write_config("");
        let settings = Settings::from_path(file.path()).unwrap();
        assert_eq!(settings.source.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.source.max_pages, 50);
        assert_eq!(settings.source.page_delay(), Duration::from_millis(300));
        assert_eq!(settings.source.request_timeout(), Duration::from_secs(10));
        assert_eq!(settings.cache.ttl(), Duration::from_secs(28_800));
        assert_eq!(settings.normalize.default_decimals, 18);
        assert!(settings.normalize.dedup_by_hash);
        assert_eq!(settings.analytics.percentile, 0.95);
        assert_eq!(settings.analytics.rolling_window, 7);
        assert_eq!(settings.analytics.supply_definition, SupplyDefinition::NetMintBurn);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = write_config(
            "[source]\nmax_pages = 3\n\n[analytics]\nsupply_definition = \"transfer_volume\"\ntop_n = 5\n",
        );
        let settings = Settings::from_path(file.path()).unwrap();
        assert_eq!(settings.source.max_pages, 3);
        assert_eq!(settings.analytics.top_n, 5);
        assert_eq!(settings.analytics.supply_definition, SupplyDefinition::TransferVolume);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let file = write_config("[source]\nmax_pages = 0\n");
        assert!(Settings::from_path(file.path()).is_err());

        let file = write_config("[analytics]\npercentile = 1.5\n");
        assert!(Settings::from_path(file.path()).is_err());

        let file = write_config("[analytics]\nrolling_window = 3\nrolling_min_periods = 4\n");
        assert!(Settings::from_path(file.path()).is_err());
    }

    #[test]
    fn test_normalizer_config_mapping() {
        let settings = NormalizeSettings {
            default_decimals: 6,
            dedup_by_hash: false,
        };
        let cfg = settings.normalizer_config();
        assert_eq!(cfg.default_decimals, 6);
        assert!(!cfg.dedup_by_hash);
    }
}
