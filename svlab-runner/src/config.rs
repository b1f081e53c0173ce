//! Serializable evaluation configuration.
//!
//! A [`RunConfig`] is assembled from layered sources: built-in defaults, an
//! optional TOML file (`[backtest]`, `[market]`, `[simulation]`, every field
//! optional) and command-line overrides, applied in that order.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use svlab_core::data::{ParsePeriodError, Period};
use svlab_core::engine::{EngineConfig, DEFAULT_CUSTODY_INTERVAL};
use svlab_core::factory::{create_strategy, parse_precompute_list, resolve_indicators, FactoryError};
use svlab_core::sv::CalibrationConfig;

/// Unique identifier for an evaluation run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),

    #[error("unknown indicator '{0}'")]
    UnknownIndicator(String),

    #[error(transparent)]
    UnknownPeriod(#[from] ParsePeriodError),

    #[error("invalid number for {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("num_paths must be at least 1")]
    ZeroPaths,

    #[error("period {0} has no simulation horizon; use 1y, 5y or 10y")]
    NoHorizon(Period),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(String),
}

impl From<FactoryError> for ConfigError {
    fn from(e: FactoryError) -> Self {
        match e {
            FactoryError::UnknownStrategy(name) => ConfigError::UnknownStrategy(name),
            FactoryError::UnknownIndicator(name) => ConfigError::UnknownIndicator(name),
        }
    }
}

/// `[backtest]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub capital: u64,
    pub transaction_fee: f64,
    pub custody_fee: f64,
    /// Custody is charged on every tick that is a positive multiple of this.
    pub custody_interval: usize,
    pub strategy: String,
    /// Comma-separated registry names.
    pub precompute: String,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            capital: 10_000,
            transaction_fee: 0.01,
            custody_fee: 0.02,
            custody_interval: DEFAULT_CUSTODY_INTERVAL,
            strategy: "three_ema_crossover".into(),
            precompute: "indicator_three_ema_crossover".into(),
        }
    }
}

/// `[market]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSection {
    pub ticker: String,
    pub real_period: Period,
    pub sim_period: Period,
}

impl Default for MarketSection {
    fn default() -> Self {
        Self {
            ticker: "^GSPC".into(),
            real_period: Period::TenYears,
            sim_period: Period::TenYears,
        }
    }
}

/// `[simulation]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    pub num_paths: usize,
    /// Master seed. Unset draws a fresh one per run.
    pub seed: Option<u64>,
    pub diagnostics: bool,
    pub sweeps: usize,
    pub paths_per_point: usize,
    pub top_k: usize,
}

impl Default for SimulationSection {
    fn default() -> Self {
        let calibration = CalibrationConfig::default();
        Self {
            num_paths: 20,
            seed: None,
            diagnostics: true,
            sweeps: calibration.sweeps,
            paths_per_point: calibration.paths_per_point,
            top_k: calibration.top_k,
        }
    }
}

/// Complete configuration for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub backtest: BacktestSection,
    pub market: MarketSection,
    pub simulation: SimulationSection,
}

impl RunConfig {
    /// Parse a TOML document. Missing sections and fields keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Check every name and number before any data is fetched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        create_strategy(&self.backtest.strategy)?;
        resolve_indicators(&self.precompute_names())?;
        for (field, value) in [
            ("transaction_fee", self.backtest.transaction_fee),
            ("custody_fee", self.backtest.custody_fee),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }
        if self.simulation.num_paths == 0 {
            return Err(ConfigError::ZeroPaths);
        }
        if self.market.sim_period.horizon_days().is_none() {
            return Err(ConfigError::NoHorizon(self.market.sim_period));
        }
        Ok(())
    }

    pub fn precompute_names(&self) -> Vec<String> {
        parse_precompute_list(&self.backtest.precompute)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(
            self.backtest.capital as f64,
            self.backtest.transaction_fee,
            self.backtest.custody_fee,
        )
        .with_custody_interval(self.backtest.custody_interval)
    }

    pub fn calibration_config(&self) -> CalibrationConfig {
        CalibrationConfig {
            sweeps: self.simulation.sweeps,
            paths_per_point: self.simulation.paths_per_point,
            top_k: self.simulation.top_k,
            ..CalibrationConfig::default()
        }
    }

    /// Hash ID of this configuration run under `master_seed`.
    ///
    /// The resolved seed replaces the configured one, so two unseeded runs get
    /// distinct IDs and a seeded replay of a run shares its ID.
    pub fn run_id(&self, master_seed: u64) -> Result<RunId, ConfigError> {
        let mut resolved = self.clone();
        resolved.simulation.seed = Some(master_seed);
        let json =
            serde_json::to_string(&resolved).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Apply command-line overrides on top of this config.
    pub fn apply(&mut self, o: &ConfigOverrides) -> Result<(), ConfigError> {
        if let Some(v) = &o.capital {
            self.backtest.capital = parse_number("capital", v)?;
        }
        if let Some(v) = &o.transaction_fee {
            self.backtest.transaction_fee = parse_number("transaction_fee", v)?;
        }
        if let Some(v) = &o.custody_fee {
            self.backtest.custody_fee = parse_number("custody_fee", v)?;
        }
        if let Some(v) = o.custody_interval {
            self.backtest.custody_interval = v;
        }
        if let Some(v) = &o.strategy {
            self.backtest.strategy = v.clone();
        }
        if let Some(v) = &o.precompute {
            self.backtest.precompute = v.clone();
        }
        if let Some(v) = &o.ticker {
            self.market.ticker = v.clone();
        }
        if let Some(v) = &o.real_period {
            self.market.real_period = v.parse()?;
        }
        if let Some(v) = &o.sim_period {
            self.market.sim_period = v.parse()?;
        }
        if let Some(v) = o.num_paths {
            self.simulation.num_paths = v;
        }
        if o.seed.is_some() {
            self.simulation.seed = o.seed;
        }
        if o.no_diagnostics {
            self.simulation.diagnostics = false;
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

/// Command-line level overrides. Numbers stay textual until applied so a
/// malformed value surfaces as [`ConfigError::InvalidNumber`].
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub capital: Option<String>,
    pub transaction_fee: Option<String>,
    pub custody_fee: Option<String>,
    pub custody_interval: Option<usize>,
    pub strategy: Option<String>,
    pub precompute: Option<String>,
    pub ticker: Option<String>,
    pub real_period: Option<String>,
    pub sim_period: Option<String>,
    pub num_paths: Option<usize>,
    pub seed: Option<u64>,
    pub no_diagnostics: bool,
}

/// Anything that can produce a [`RunConfig`].
pub trait ConfigSource {
    fn load(&self) -> Result<RunConfig, ConfigError>;
}

/// Built-in defaults.
pub struct Defaults;

impl ConfigSource for Defaults {
    fn load(&self) -> Result<RunConfig, ConfigError> {
        Ok(RunConfig::default())
    }
}

/// A TOML file on disk.
pub struct TomlFile(pub PathBuf);

impl ConfigSource for TomlFile {
    fn load(&self) -> Result<RunConfig, ConfigError> {
        RunConfig::from_file(&self.0)
    }
}

/// A base source with overrides applied, validated on load.
pub struct Layered<S> {
    pub base: S,
    pub overrides: ConfigOverrides,
}

impl<S: ConfigSource> ConfigSource for Layered<S> {
    fn load(&self) -> Result<RunConfig, ConfigError> {
        let mut config = self.base.load()?;
        config.apply(&self.overrides)?;
        config.validate()?;
        Ok(config)
    }
}

/// Defaults, then `file` if given, then `overrides`.
pub fn load_config(
    file: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<RunConfig, ConfigError> {
    match file {
        Some(path) => Layered {
            base: TomlFile(path.to_path_buf()),
            overrides,
        }
        .load(),
        None => Layered {
            base: Defaults,
            overrides,
        }
        .load(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = RunConfig::default();
        assert_eq!(c.backtest.capital, 10_000);
        assert_eq!(c.backtest.transaction_fee, 0.01);
        assert_eq!(c.backtest.custody_fee, 0.02);
        assert_eq!(c.backtest.custody_interval, 365);
        assert_eq!(c.backtest.strategy, "three_ema_crossover");
        assert_eq!(c.market.ticker, "^GSPC");
        assert_eq!(c.market.real_period, Period::TenYears);
        assert_eq!(c.simulation.num_paths, 20);
        assert_eq!(c.simulation.seed, None);
        assert!(c.simulation.diagnostics);
        c.validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = RunConfig::from_toml(
            r#"
            [backtest]
            capital = 5000
            strategy = "random_buy_sell"

            [market]
            ticker = "SPY"
            sim_period = "5y"

            [simulation]
            seed = 42
            "#,
        )
        .unwrap();
        assert_eq!(c.backtest.capital, 5000);
        assert_eq!(c.backtest.transaction_fee, 0.01);
        assert_eq!(c.market.ticker, "SPY");
        assert_eq!(c.market.real_period, Period::TenYears);
        assert_eq!(c.market.sim_period, Period::FiveYears);
        assert_eq!(c.simulation.seed, Some(42));
        assert_eq!(c.simulation.num_paths, 20);
    }

    #[test]
    fn negative_capital_is_a_parse_error() {
        assert!(matches!(
            RunConfig::from_toml("[backtest]\ncapital = -5"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn unknown_period_in_toml_is_rejected() {
        assert!(RunConfig::from_toml("[market]\nreal_period = \"3m\"").is_err());
    }

    #[test]
    fn overrides_apply_and_parse_numbers() {
        let mut c = RunConfig::default();
        c.apply(&ConfigOverrides {
            capital: Some("2500".into()),
            transaction_fee: Some("-0.5".into()),
            real_period: Some("1y".into()),
            seed: Some(9),
            no_diagnostics: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(c.backtest.capital, 2500);
        assert_eq!(c.backtest.transaction_fee, -0.5);
        assert_eq!(c.market.real_period, Period::OneYear);
        assert_eq!(c.simulation.seed, Some(9));
        assert!(!c.simulation.diagnostics);
    }

    #[test]
    fn bad_override_number_is_invalid_number() {
        let mut c = RunConfig::default();
        let err = c
            .apply(&ConfigOverrides {
                custody_fee: Some("lots".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                field: "custody_fee",
                ..
            }
        ));
    }

    #[test]
    fn bad_override_period_is_unknown_period() {
        let mut c = RunConfig::default();
        let err = c
            .apply(&ConfigOverrides {
                sim_period: Some("2w".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPeriod(_)));
    }

    #[test]
    fn validation_catches_bad_names_and_counts() {
        let mut c = RunConfig::default();
        c.backtest.strategy = "nope".into();
        assert!(matches!(c.validate(), Err(ConfigError::UnknownStrategy(_))));

        let mut c = RunConfig::default();
        c.backtest.precompute = "feature_sma, feature_bogus".into();
        assert!(matches!(c.validate(), Err(ConfigError::UnknownIndicator(n)) if n == "feature_bogus"));

        let mut c = RunConfig::default();
        c.simulation.num_paths = 0;
        assert!(matches!(c.validate(), Err(ConfigError::ZeroPaths)));

        let mut c = RunConfig::default();
        c.market.sim_period = Period::OneDay;
        assert!(matches!(c.validate(), Err(ConfigError::NoHorizon(Period::OneDay))));

        let mut c = RunConfig::default();
        c.backtest.custody_fee = f64::NAN;
        assert!(matches!(c.validate(), Err(ConfigError::NonFinite { .. })));
    }

    #[test]
    fn run_id_is_deterministic_and_sensitive() {
        let a = RunConfig::default();
        let mut b = a.clone();
        assert_eq!(a.run_id(3).unwrap(), b.run_id(3).unwrap());
        b.simulation.num_paths = 21;
        assert_ne!(a.run_id(3).unwrap(), b.run_id(3).unwrap());
    }

    #[test]
    fn run_id_tracks_the_resolved_seed() {
        let unseeded = RunConfig::default();
        assert_eq!(unseeded.simulation.seed, None);
        assert_ne!(unseeded.run_id(1).unwrap(), unseeded.run_id(2).unwrap());

        let mut seeded = unseeded.clone();
        seeded.simulation.seed = Some(2);
        assert_eq!(seeded.run_id(2).unwrap(), unseeded.run_id(2).unwrap());
    }

    #[test]
    fn toml_roundtrip() {
        let mut c = RunConfig::default();
        c.simulation.seed = Some(7);
        let text = c.to_toml().unwrap();
        assert_eq!(RunConfig::from_toml(&text).unwrap(), c);
    }

    #[test]
    fn file_source_layers_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("svlab.toml");
        std::fs::write(&path, "[market]\nticker = \"QQQ\"\n").unwrap();

        let c = load_config(
            Some(&path),
            ConfigOverrides {
                num_paths: Some(3),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(c.market.ticker, "QQQ");
        assert_eq!(c.simulation.num_paths, 3);

        assert!(matches!(
            load_config(Some(&dir.path().join("missing.toml")), ConfigOverrides::default()),
            Err(ConfigError::Io { .. })
        ));
    }
}
