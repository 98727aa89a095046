use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

use crate::error::SignalError;

/// One intraday sample: close price and traded volume for a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub volume: f64,
}

/// Derived per-symbol metrics, recomputed from scratch on every fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct RvolReading {
    pub symbol: String,
    pub current_price: f64,
    pub current_volume: f64,
    pub avg_volume: f64,
    pub rvol: f64,
    pub pct_change: f64,
}

/// A scan hit: a symbol whose reading passed the price and RVOL filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub symbol: String,
    pub price: f64,
    pub pct_change: f64,
    pub rvol: f64,
    pub current_volume: f64,
    pub avg_volume: f64,
}

/// Last recorded reading for a watched symbol.
///
/// All-`None` means the symbol was added to the watchlist but has never
/// been successfully observed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Snapshot {
    pub price: Option<f64>,
    pub rvol: Option<f64>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn is_unseen(&self) -> bool {
        self.price.is_none()
    }
}

/// Direction of the price move since the previous monitor check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

impl Trend {
    pub fn from_delta(delta_price_pct: f64) -> Self {
        if delta_price_pct > 0.0 {
            Trend::Up
        } else if delta_price_pct < 0.0 {
            Trend::Down
        } else {
            Trend::Neutral
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Neutral => "—",
        }
    }
}

/// One row of the monitor table: the fresh reading plus its deltas against
/// the previous check.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorRow {
    pub symbol: String,
    pub price: f64,
    pub rvol: f64,
    pub current_volume: f64,
    pub avg_volume: f64,
    pub delta_price_pct: f64,
    pub delta_rvol: f64,
    pub trend: Trend,
    pub last_checked: DateTime<Utc>,
}

/// A symbol excluded from the current batch, with the structured reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SignalError,
}

/// Uppercases and trims a user-entered ticker.
///
/// Accepts ASCII alphanumerics plus the punctuation that appears in real
/// listings (BRK.B, BF-B, ^GSPC, BTC=F); anything else is rejected.
pub fn normalize_symbol(raw: &str) -> Result<String, SignalError> {
    let symbol = raw.trim().to_ascii_uppercase();
    let valid = !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    if valid {
        Ok(symbol)
    } else {
        Err(SignalError::InvalidSymbol(raw.trim().to_string()))
    }
}

/// Rounds half away from zero for display. Presentation boundary only; the
/// calculators always hand back unrounded values.
pub fn round_display(value: f64, dp: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_uppercases_and_trims() {
        assert_eq!(normalize_symbol("  aapl "), Ok("AAPL".to_string()));
        assert_eq!(normalize_symbol("brk.b"), Ok("BRK.B".to_string()));
        assert_eq!(normalize_symbol("^gspc"), Ok("^GSPC".to_string()));
    }

    #[test]
    fn normalize_rejects_garbage() {
        assert_eq!(
            normalize_symbol(""),
            Err(SignalError::InvalidSymbol(String::new()))
        );
        assert_eq!(
            normalize_symbol("AA PL"),
            Err(SignalError::InvalidSymbol("AA PL".to_string()))
        );
        assert_eq!(
            normalize_symbol("Tsla;drop"),
            Err(SignalError::InvalidSymbol("Tsla;drop".to_string()))
        );
    }

    #[test]
    fn trend_follows_delta_sign() {
        assert_eq!(Trend::from_delta(0.01), Trend::Up);
        assert_eq!(Trend::from_delta(-0.01), Trend::Down);
        assert_eq!(Trend::from_delta(0.0), Trend::Neutral);
    }

    #[test]
    fn round_display_is_half_away_from_zero() {
        assert_eq!(round_display(2.345, 2), 2.35);
        assert_eq!(round_display(-2.345, 2), -2.35);
        assert_eq!(round_display(2.344, 2), 2.34);
        assert_eq!(round_display(1.0005, 3), 1.001);
    }
}
