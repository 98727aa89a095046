//! Watchlist and per-symbol snapshot tracking.
//!
//! The monitor compares each fresh reading against the symbol's previous
//! snapshot, emits the deltas, then overwrites the snapshot in the same
//! step. The next cycle always compares against this cycle's values.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::error::SignalError;
use crate::extract;
use crate::fetch::{BarFetcher, ChartQuery};
use crate::rvol;
use crate::types::{normalize_symbol, MonitorRow, SkippedSymbol, Snapshot, Trend};

/// The monitoring universe: ordered unique symbols plus the last recorded
/// reading for each. A watched symbol always has a snapshot entry.
#[derive(Debug, Default)]
pub struct MonitorSet {
    symbols: Vec<String>,
    snapshots: HashMap<String, Snapshot>,
}

impl MonitorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes and inserts. Returns `Ok(false)` when already watched.
    pub fn add(&mut self, raw: &str) -> Result<bool, SignalError> {
        let symbol = normalize_symbol(raw)?;
        if self.snapshots.contains_key(&symbol) {
            return Ok(false);
        }
        self.snapshots.insert(symbol.clone(), Snapshot::default());
        self.symbols.push(symbol);
        Ok(true)
    }

    /// Removes the symbol and its snapshot. Re-adding later starts over
    /// from the unseen state.
    pub fn remove(&mut self, raw: &str) -> bool {
        let Ok(symbol) = normalize_symbol(raw) else {
            return false;
        };
        if self.snapshots.remove(&symbol).is_some() {
            self.symbols.retain(|s| s != &symbol);
            true
        } else {
            false
        }
    }

    /// Replaces the whole watchlist. Snapshots of retained symbols
    /// survive, new symbols start unseen, and malformed entries are
    /// returned instead of applied.
    pub fn replace_all<I, S>(&mut self, entries: I) -> Vec<SkippedSymbol>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rejected = Vec::new();
        let mut next_symbols = Vec::new();
        let mut next_snapshots = HashMap::new();

        for entry in entries {
            match normalize_symbol(entry.as_ref()) {
                Ok(symbol) => {
                    if next_snapshots.contains_key(&symbol) {
                        continue;
                    }
                    let snapshot = self.snapshots.get(&symbol).copied().unwrap_or_default();
                    next_snapshots.insert(symbol.clone(), snapshot);
                    next_symbols.push(symbol);
                }
                Err(reason) => rejected.push(SkippedSymbol {
                    symbol: entry.as_ref().trim().to_ascii_uppercase(),
                    reason,
                }),
            }
        }

        self.symbols = next_symbols;
        self.snapshots = next_snapshots;
        rejected
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn contains(&self, raw: &str) -> bool {
        normalize_symbol(raw)
            .map(|symbol| self.snapshots.contains_key(&symbol))
            .unwrap_or(false)
    }

    pub fn snapshot(&self, symbol: &str) -> Option<&Snapshot> {
        self.snapshots.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Everything one monitor pass produced.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub rows: Vec<MonitorRow>,
    pub skipped: Vec<SkippedSymbol>,
}

/// Runs one monitoring pass over the watchlist.
///
/// Fetches fan out up to `concurrency` at a time; deltas and snapshot
/// overwrites are applied sequentially in watchlist order, so each
/// symbol's entry has exactly one writer per cycle. A symbol that cannot
/// be read this cycle keeps its previous snapshot and is retried next
/// cycle; it is never treated as a zero delta.
pub async fn run_monitor_cycle_once<F>(
    set: &mut MonitorSet,
    fetcher: &F,
    query: &ChartQuery,
    lookback: usize,
    concurrency: usize,
    now: DateTime<Utc>,
) -> CycleReport
where
    F: BarFetcher + Sync,
{
    let watched = set.symbols.clone();
    let fetched: Vec<_> = stream::iter(watched)
        .map(|symbol| async move {
            let table = fetcher.fetch_bars(&symbol, query).await;
            (symbol, table)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut report = CycleReport::default();
    for (symbol, fetch_result) in fetched {
        let reading = match fetch_result {
            Ok(table) => extract::extract_bars(&table, &symbol)
                .and_then(|bars| rvol::compute_adaptive(&symbol, &bars, lookback)),
            Err(err) => {
                tracing::warn!(%symbol, error = %err, "fetch failed");
                Err(SignalError::NoData)
            }
        };
        let reading = match reading {
            Ok(reading) => reading,
            Err(reason) => {
                tracing::debug!(%symbol, %reason, "no data this cycle");
                report.skipped.push(SkippedSymbol { symbol, reason });
                continue;
            }
        };

        let prior = set.snapshots.get(&symbol).copied().unwrap_or_default();
        let (delta_price_pct, delta_rvol, trend) = match (prior.price, prior.rvol) {
            (Some(old_price), Some(old_rvol)) => {
                let delta_price_pct = (reading.current_price - old_price) / old_price * 100.0;
                (
                    delta_price_pct,
                    reading.rvol - old_rvol,
                    Trend::from_delta(delta_price_pct),
                )
            }
            // first observation: nothing meaningful to compare against
            _ => (0.0, 0.0, Trend::Neutral),
        };

        set.snapshots.insert(
            symbol.clone(),
            Snapshot {
                price: Some(reading.current_price),
                rvol: Some(reading.rvol),
                last_checked: Some(now),
            },
        );

        report.rows.push(MonitorRow {
            symbol,
            price: reading.current_price,
            rvol: reading.rvol,
            current_volume: reading.current_volume,
            avg_volume: reading.avg_volume,
            delta_price_pct,
            delta_rvol,
            trend,
            last_checked: now,
        });
    }
    report
}
