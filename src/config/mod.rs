//! User configuration: base currency, conversion rates, and planning caps.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    currency::{self, CurrencyCode, RateTable, DEFAULT_BASE_CURRENCY},
    errors::{PlanError, Result},
    planning::{
        engine::{DEFAULT_RECURRENCE_YEARS, MINIMUM_HORIZON_YEARS},
        PlanningEngine, MAX_OCCURRENCES,
    },
    utils::{fs::write_atomic, paths},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "Config::default_base_currency")]
    pub base_currency: String,
    /// Base-currency units per one unit of each foreign code.
    #[serde(default = "currency::default_rates")]
    pub rates: BTreeMap<String, f64>,
    #[serde(default = "Config::default_minimum_horizon_years")]
    pub minimum_horizon_years: u32,
    /// Horizon for recurring goals without an end date.
    #[serde(default = "Config::default_horizon_years")]
    pub default_horizon_years: u32,
    #[serde(default = "Config::default_max_occurrences")]
    pub max_occurrences: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_currency: Self::default_base_currency(),
            rates: currency::default_rates(),
            minimum_horizon_years: Self::default_minimum_horizon_years(),
            default_horizon_years: Self::default_horizon_years(),
            max_occurrences: Self::default_max_occurrences(),
            data_dir: None,
        }
    }
}

impl Config {
    fn default_base_currency() -> String {
        DEFAULT_BASE_CURRENCY.into()
    }

    fn default_minimum_horizon_years() -> u32 {
        MINIMUM_HORIZON_YEARS
    }

    fn default_horizon_years() -> u32 {
        DEFAULT_RECURRENCE_YEARS
    }

    fn default_max_occurrences() -> usize {
        MAX_OCCURRENCES
    }

    pub fn rate_table(&self) -> Result<RateTable> {
        let mut table = RateTable::new(CurrencyCode::new(&self.base_currency));
        for (code, rate) in &self.rates {
            table
                .set_rate(code, *rate)
                .map_err(|err| PlanError::ConfigError(err.to_string()))?;
        }
        Ok(table)
    }

    pub fn engine(&self) -> Result<PlanningEngine> {
        if self.max_occurrences == 0 {
            return Err(PlanError::ConfigError(
                "max_occurrences must be at least 1".into(),
            ));
        }
        Ok(PlanningEngine::new(self.rate_table()?)
            .with_max_occurrences(self.max_occurrences)
            .with_horizon_years(self.minimum_horizon_years, self.default_horizon_years))
    }

    /// Directory holding the goal book, honouring `data_dir` when set.
    pub fn data_root(&self, fallback: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| fallback.to_path_buf())
    }

    /// Updates one setting from its textual key, as typed in the shell.
    ///
    /// Rates are addressed as `rate.<CODE>`.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |what: &str| {
            PlanError::ConfigError(format!("`{}` is not a valid {} for `{}`", value, what, key))
        };
        match key {
            "base_currency" => {
                let code = CurrencyCode::new(value);
                if code.as_str().is_empty() {
                    return Err(invalid("currency code"));
                }
                self.rebase(code)?;
            }
            "minimum_horizon_years" => {
                self.minimum_horizon_years = value.parse().map_err(|_| invalid("year count"))?;
            }
            "default_horizon_years" => {
                self.default_horizon_years = value.parse().map_err(|_| invalid("year count"))?;
            }
            "max_occurrences" => {
                let parsed: usize = value.parse().map_err(|_| invalid("occurrence count"))?;
                if parsed == 0 {
                    return Err(invalid("occurrence count"));
                }
                self.max_occurrences = parsed;
            }
            other => match other.strip_prefix("rate.") {
                Some(code) if !code.trim().is_empty() => {
                    let rate: f64 = value.parse().map_err(|_| invalid("rate"))?;
                    if !rate.is_finite() || rate <= 0.0 {
                        return Err(invalid("rate"));
                    }
                    self.rates.insert(CurrencyCode::new(code).0, rate);
                }
                _ => {
                    return Err(PlanError::ConfigError(format!(
                        "unknown configuration key `{}`",
                        key
                    )))
                }
            },
        }
        Ok(())
    }

    /// Switches the base currency, re-expressing every rate in the new base.
    ///
    /// The new base must already have a rate; the old base joins the table
    /// at the inverse of that rate.
    fn rebase(&mut self, code: CurrencyCode) -> Result<()> {
        let old_base = CurrencyCode::new(&self.base_currency);
        if code == old_base {
            self.base_currency = code.0;
            return Ok(());
        }
        let pivot = self
            .rates
            .get(code.as_str())
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .ok_or_else(|| {
                PlanError::ConfigError(format!(
                    "no rate for `{code}`; set `rate.{code}` before making it the base currency"
                ))
            })?;
        self.rates.remove(code.as_str());
        for rate in self.rates.values_mut() {
            *rate /= pivot;
        }
        self.rates.insert(old_base.0, 1.0 / pivot);
        self.base_currency = code.0;
        Ok(())
    }
}

/// Loads and saves [`Config`] as JSON.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn with_base_dir(base: &Path) -> Self {
        Self::new(paths::config_file_in(base))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|err| PlanError::ConfigError(err.to_string()))
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path());
        assert_eq!(manager.load().unwrap(), Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path());
        fs::write(manager.path(), r#"{ "base_currency": "usd", "rates": { "UAH": 0.024 } }"#)
            .unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.max_occurrences, MAX_OCCURRENCES);
        let table = config.rate_table().unwrap();
        assert_eq!(table.base().as_str(), "USD");
        assert!((table.rate_for(&CurrencyCode::new("UAH")).unwrap() - 0.024).abs() < 1e-12);
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path());
        let mut config = Config::default();
        config.set_value("rate.gbp", "52").unwrap();
        config.set_value("default_horizon_years", "10").unwrap();
        manager.save(&config).unwrap();
        assert_eq!(manager.load().unwrap(), config);
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set_value("rate.USD", "-3").is_err());
        assert!(config.set_value("max_occurrences", "0").is_err());
        assert!(config.set_value("colour", "blue").is_err());
        assert!(matches!(
            config.set_value("base_currency", "JPY"),
            Err(PlanError::ConfigError(_))
        ));
        assert_eq!(config.base_currency, "UAH");
        config.rates.insert("EUR".into(), 0.0);
        assert!(matches!(config.rate_table(), Err(PlanError::ConfigError(_))));
    }

    #[test]
    fn switching_base_currency_rebases_rates() {
        let mut config = Config::default();
        config.set_value("base_currency", "usd").unwrap();
        assert_eq!(config.base_currency, "USD");
        assert!(!config.rates.contains_key("USD"));

        let table = config.rate_table().unwrap();
        let eur = table.rate_for(&CurrencyCode::new("EUR")).unwrap();
        let uah = table.rate_for(&CurrencyCode::new("UAH")).unwrap();
        assert!((eur - 44.0 / 41.0).abs() < 1e-12);
        assert!((uah - 1.0 / 41.0).abs() < 1e-12);
        assert!((table.to_base(4100.0, &CurrencyCode::new("UAH")).unwrap() - 100.0).abs() < 1e-9);

        config.set_value("base_currency", "UAH").unwrap();
        assert!((config.rates["USD"] - 41.0).abs() < 1e-9);
        assert!((config.rates["EUR"] - 44.0).abs() < 1e-9);
    }
}
