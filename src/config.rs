use anyhow::Result;
use std::env;
use std::time::Duration;

use crate::fetch::ChartQuery;
use crate::scanner::ScanParams;

/// Runtime configuration, loaded from environment variables with the
/// defaults the dashboard shipped with.
#[derive(Debug, Clone)]
pub struct Config {
    // Signal parameters
    pub lookback: usize,
    pub min_rvol: f64,
    pub min_price: f64,
    pub max_price: f64,

    // Scan behaviour
    pub max_symbols: usize,
    pub scan_window_days: i64,

    // Monitor behaviour
    pub refresh_secs: u64,
    pub monitor_window_days: i64,

    // Fetch behaviour
    pub fetch_timeout_secs: u64,
    pub fetch_concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            lookback: env_or("RVOL_LOOKBACK", 50),
            min_rvol: env_or("RVOL_MIN", 2.0),
            min_price: env_or("PRICE_MIN", 2.0),
            max_price: env_or("PRICE_MAX", 20.0),
            max_symbols: env_or("SCAN_MAX_SYMBOLS", 200),
            scan_window_days: env_or("SCAN_WINDOW_DAYS", 7),
            refresh_secs: env_or("MONITOR_REFRESH_SECS", 60),
            monitor_window_days: env_or("MONITOR_WINDOW_DAYS", 2),
            fetch_timeout_secs: env_or("FETCH_TIMEOUT_SECS", 20),
            fetch_concurrency: env_or("FETCH_CONCURRENCY", 4),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.lookback == 0 {
            anyhow::bail!("RVOL_LOOKBACK must be greater than 0");
        }

        if self.min_rvol <= 0.0 {
            anyhow::bail!("RVOL_MIN must be greater than 0");
        }

        if self.min_price < 0.0 {
            anyhow::bail!("PRICE_MIN must not be negative");
        }

        if self.max_price < self.min_price {
            anyhow::bail!("PRICE_MAX must be at least PRICE_MIN");
        }

        if self.max_symbols == 0 {
            anyhow::bail!("SCAN_MAX_SYMBOLS must be greater than 0");
        }

        if self.refresh_secs == 0 {
            anyhow::bail!("MONITOR_REFRESH_SECS must be greater than 0");
        }

        if self.fetch_concurrency == 0 {
            anyhow::bail!("FETCH_CONCURRENCY must be greater than 0");
        }

        Ok(())
    }

    pub fn scan_params(&self) -> ScanParams {
        ScanParams {
            lookback: self.lookback,
            min_price: self.min_price,
            max_price: self.max_price,
            min_rvol: self.min_rvol,
            concurrency: self.fetch_concurrency,
        }
    }

    /// Scan window: a week of intraday bars, enough for any lookback the
    /// UI offers.
    pub fn scan_query(&self) -> ChartQuery {
        ChartQuery::intraday(self.scan_window_days)
    }

    /// Monitor window: shorter, the cycle only needs recent bars.
    pub fn monitor_query(&self) -> ChartQuery {
        ChartQuery::intraday(self.monitor_window_days)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            lookback: 50,
            min_rvol: 2.0,
            min_price: 2.0,
            max_price: 20.0,
            max_symbols: 200,
            scan_window_days: 7,
            refresh_secs: 60,
            monitor_window_days: 2,
            fetch_timeout_secs: 20,
            fetch_concurrency: 4,
        }
    }

    #[test]
    fn default_config_validates() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn inverted_price_range_is_rejected() {
        let mut config = base();
        config.min_price = 30.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_lookback_is_rejected() {
        let mut config = base();
        config.lookback = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_min_rvol_is_rejected() {
        let mut config = base();
        config.min_rvol = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_or_falls_back_on_unparsable_values() {
        env::set_var("RVOL_TEST_BAD_NUMBER", "not-a-number");
        assert_eq!(env_or("RVOL_TEST_BAD_NUMBER", 7usize), 7);
        assert_eq!(env_or("RVOL_TEST_UNSET_KEY", 9usize), 9);
        env::remove_var("RVOL_TEST_BAD_NUMBER");
    }
}
