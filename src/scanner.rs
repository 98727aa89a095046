//! One-shot breakout scan across a symbol universe.

use std::cmp::Ordering;

use futures::stream::{self, StreamExt};

use crate::error::SignalError;
use crate::extract;
use crate::fetch::{BarFetcher, ChartQuery};
use crate::rvol;
use crate::types::{normalize_symbol, RvolReading, ScanResult, SkippedSymbol};

/// Filter and fan-out parameters for one scan pass.
#[derive(Debug, Clone)]
pub struct ScanParams {
    pub lookback: usize,
    pub min_price: f64,
    pub max_price: f64,
    pub min_rvol: f64,
    pub concurrency: usize,
}

/// Everything one scan pass produced: ranked hits plus the symbols that
/// could not be read, each with its reason.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub results: Vec<ScanResult>,
    pub skipped: Vec<SkippedSymbol>,
}

/// Scans `symbols` in input order against the price and RVOL filters.
///
/// Each symbol is handled independently; a fetch or compute failure skips
/// that symbol and never aborts the batch. Fetches fan out up to
/// `concurrency` at a time but are collected in input order, so identical
/// inputs and identical fetched data always rank identically.
pub async fn run_scan_once<F>(
    fetcher: &F,
    symbols: &[String],
    query: &ChartQuery,
    params: &ScanParams,
) -> ScanOutcome
where
    F: BarFetcher + Sync,
{
    let mut outcome = ScanOutcome::default();

    let mut valid = Vec::with_capacity(symbols.len());
    for raw in symbols {
        match normalize_symbol(raw) {
            Ok(symbol) => valid.push(symbol),
            Err(reason) => outcome.skipped.push(SkippedSymbol {
                symbol: raw.trim().to_ascii_uppercase(),
                reason,
            }),
        }
    }

    let fetched: Vec<_> = stream::iter(valid)
        .map(|symbol| async move {
            let table = fetcher.fetch_bars(&symbol, query).await;
            (symbol, table)
        })
        .buffered(params.concurrency.max(1))
        .collect()
        .await;

    for (symbol, fetch_result) in fetched {
        let reading = match fetch_result {
            Ok(table) => extract::extract_bars(&table, &symbol)
                .and_then(|bars| rvol::compute(&symbol, &bars, params.lookback)),
            Err(err) => {
                tracing::warn!(%symbol, error = %err, "fetch failed");
                Err(SignalError::NoData)
            }
        };
        match reading {
            Ok(reading) if passes_filters(&reading, params) => {
                outcome.results.push(ScanResult {
                    symbol: reading.symbol,
                    price: reading.current_price,
                    pct_change: reading.pct_change,
                    rvol: reading.rvol,
                    current_volume: reading.current_volume,
                    avg_volume: reading.avg_volume,
                });
            }
            Ok(reading) => {
                tracing::debug!(
                    symbol = %reading.symbol,
                    price = reading.current_price,
                    rvol = reading.rvol,
                    "below thresholds"
                );
            }
            Err(reason) => {
                tracing::debug!(%symbol, %reason, "skipped");
                outcome.skipped.push(SkippedSymbol { symbol, reason });
            }
        }
    }

    rank(&mut outcome.results);
    outcome
}

fn passes_filters(reading: &RvolReading, params: &ScanParams) -> bool {
    reading.current_price >= params.min_price
        && reading.current_price <= params.max_price
        && reading.rvol >= params.min_rvol
}

// Descending %-change, then descending RVOL. The sort is stable, so ties
// keep their input order.
fn rank(results: &mut [ScanResult]) {
    results.sort_by(|a, b| {
        b.pct_change
            .partial_cmp(&a.pct_change)
            .unwrap_or(Ordering::Equal)
            .then(b.rvol.partial_cmp(&a.rvol).unwrap_or(Ordering::Equal))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ColumnKey, RawColumn, RawTable};
    use crate::fetch::FetchError;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    struct StubFetcher {
        tables: HashMap<String, RawTable>,
    }

    #[async_trait]
    impl BarFetcher for StubFetcher {
        async fn fetch_bars(
            &self,
            symbol: &str,
            _query: &ChartQuery,
        ) -> Result<RawTable, FetchError> {
            self.tables
                .get(symbol)
                .cloned()
                .ok_or(FetchError::Empty)
        }
    }

    /// Flat table whose last bar closes at `price` with volume `rvol` times
    /// the flat trailing volume of 100.
    fn table(price: f64, rvol: f64, bars: usize) -> RawTable {
        let close = vec![Some(price); bars];
        let mut volume = vec![Some(100.0); bars];
        *volume.last_mut().unwrap() = Some(100.0 * rvol);
        RawTable {
            timestamps: (0..bars as i64)
                .map(|i| Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap())
                .collect(),
            columns: vec![
                RawColumn {
                    key: ColumnKey::Flat("Close".to_string()),
                    values: close,
                },
                RawColumn {
                    key: ColumnKey::Flat("Volume".to_string()),
                    values: volume,
                },
            ],
        }
    }

    fn params() -> ScanParams {
        ScanParams {
            lookback: 3,
            min_price: 2.0,
            max_price: 20.0,
            min_rvol: 2.0,
            concurrency: 2,
        }
    }

    fn fetcher(entries: Vec<(&str, RawTable)>) -> StubFetcher {
        StubFetcher {
            tables: entries
                .into_iter()
                .map(|(s, t)| (s.to_string(), t))
                .collect(),
        }
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn filters_apply_to_price_range_and_rvol() {
        let fetcher = fetcher(vec![
            ("EXPENSIVE", table(25.0, 5.0, 10)), // price above range
            ("SLEEPY", table(10.0, 1.5, 10)),    // rvol below threshold
            ("HIT", table(10.0, 3.0, 10)),
        ]);
        let outcome = run_scan_once(
            &fetcher,
            &symbols(&["EXPENSIVE", "SLEEPY", "HIT"]),
            &ChartQuery::intraday(7),
            &params(),
        )
        .await;

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].symbol, "HIT");
        assert_eq!(outcome.results[0].rvol, 3.0);
        // filtered-out symbols are neither hits nor skip reports
        assert!(outcome.skipped.is_empty());
    }

    #[tokio::test]
    async fn one_bad_symbol_never_aborts_the_batch() {
        let fetcher = fetcher(vec![
            ("GOOD", table(10.0, 3.0, 10)),
            ("THIN", table(10.0, 3.0, 2)), // fewer than lookback + 1 bars
        ]);
        let outcome = run_scan_once(
            &fetcher,
            &symbols(&["MISSING", "THIN", "GOOD", "b a d"]),
            &ChartQuery::intraday(7),
            &params(),
        )
        .await;

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].symbol, "GOOD");
        assert_eq!(outcome.skipped.len(), 3);
        assert!(outcome
            .skipped
            .iter()
            .any(|s| s.symbol == "MISSING" && s.reason == SignalError::NoData));
        assert!(outcome.skipped.iter().any(|s| matches!(
            s.reason,
            SignalError::InsufficientHistory { have: 2, need: 4 }
        )));
        assert!(outcome
            .skipped
            .iter()
            .any(|s| matches!(s.reason, SignalError::InvalidSymbol(_))));
    }

    #[tokio::test]
    async fn ranking_is_pct_change_then_rvol_then_input_order() {
        // same flat closes, so pct_change is 0 for all; rvol decides
        let fetcher = fetcher(vec![
            ("A", table(10.0, 2.5, 10)),
            ("B", table(10.0, 4.0, 10)),
            ("C", table(10.0, 2.5, 10)), // ties with A, must stay after it
        ]);
        let outcome = run_scan_once(
            &fetcher,
            &symbols(&["A", "B", "C"]),
            &ChartQuery::intraday(7),
            &params(),
        )
        .await;

        let order: Vec<&str> = outcome.results.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
    }

    #[tokio::test]
    async fn identical_inputs_scan_identically() {
        let fetcher = fetcher(vec![
            ("A", table(10.0, 2.5, 10)),
            ("B", table(10.0, 4.0, 10)),
            ("C", table(3.0, 2.1, 10)),
        ]);
        let input = symbols(&["A", "B", "C"]);
        let query = ChartQuery::intraday(7);

        let first = run_scan_once(&fetcher, &input, &query, &params()).await;
        let second = run_scan_once(&fetcher, &input, &query, &params()).await;
        assert_eq!(first.results, second.results);
        assert_eq!(first.skipped, second.skipped);
    }

    #[tokio::test]
    async fn symbols_are_normalized_before_fetching() {
        let fetcher = fetcher(vec![("HIT", table(10.0, 3.0, 10))]);
        let outcome = run_scan_once(
            &fetcher,
            &symbols(&["  hit "]),
            &ChartQuery::intraday(7),
            &params(),
        )
        .await;
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].symbol, "HIT");
    }
}
