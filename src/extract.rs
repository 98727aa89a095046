//! Normalizes raw market-data payloads into ordered bar series.
//!
//! Upstream chart feeds do not agree on a column layout: sometimes a flat
//! `Close`/`Volume` pair, sometimes two-level keys in `(symbol, field)` or
//! `(field, symbol)` order, sometimes only an adjusted close. Resolution is
//! an explicit ordered list of strategies, first success wins, so the
//! precedence stays testable when the upstream schema shifts again.

use chrono::{DateTime, Utc};

use crate::error::SignalError;
use crate::types::Bar;

/// Column label of a raw payload: flat, or two-level in either order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKey {
    Flat(String),
    Pair(String, String),
}

#[derive(Debug, Clone)]
pub struct RawColumn {
    pub key: ColumnKey,
    pub values: Vec<Option<f64>>,
}

/// Column-keyed table for exactly one symbol, as returned by one fetch.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub timestamps: Vec<DateTime<Utc>>,
    pub columns: Vec<RawColumn>,
}

impl RawTable {
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

type Strategy = fn(&RawTable, &str, &str) -> Option<usize>;

const STRATEGIES: &[Strategy] = &[
    flat_exact,
    flat_adjusted,
    pair_symbol_field,
    pair_field_symbol,
    pair_field_loose,
];

fn flat_exact(table: &RawTable, field: &str, _symbol: &str) -> Option<usize> {
    table
        .columns
        .iter()
        .position(|c| matches!(&c.key, ColumnKey::Flat(name) if name == field))
}

// "Adj Close" stands in for a missing "Close"; volume has no analogue.
fn flat_adjusted(table: &RawTable, field: &str, _symbol: &str) -> Option<usize> {
    if field != "Close" {
        return None;
    }
    table
        .columns
        .iter()
        .position(|c| matches!(&c.key, ColumnKey::Flat(name) if name == "Adj Close"))
}

fn pair_symbol_field(table: &RawTable, field: &str, symbol: &str) -> Option<usize> {
    table
        .columns
        .iter()
        .position(|c| matches!(&c.key, ColumnKey::Pair(a, b) if a == symbol && b == field))
}

fn pair_field_symbol(table: &RawTable, field: &str, symbol: &str) -> Option<usize> {
    table
        .columns
        .iter()
        .position(|c| matches!(&c.key, ColumnKey::Pair(a, b) if a == field && b == symbol))
}

// Last resort for two-level keys: first column whose key mentions the
// field at all, regardless of which level or casing carries it.
fn pair_field_loose(table: &RawTable, field: &str, _symbol: &str) -> Option<usize> {
    table.columns.iter().position(|c| {
        matches!(&c.key, ColumnKey::Pair(a, b)
            if a.eq_ignore_ascii_case(field) || b.eq_ignore_ascii_case(field))
    })
}

/// Finds the column holding `field` for `symbol`, trying each resolution
/// strategy in precedence order.
pub fn resolve_column(table: &RawTable, field: &str, symbol: &str) -> Option<usize> {
    STRATEGIES
        .iter()
        .find_map(|strategy| strategy(table, field, symbol))
}

/// Locates the close and volume columns and zips them into bars, dropping
/// any row where either value is missing. Never interpolates.
pub fn extract_bars(table: &RawTable, symbol: &str) -> Result<Vec<Bar>, SignalError> {
    if table.is_empty() {
        return Err(SignalError::NoData);
    }

    let close_idx =
        resolve_column(table, "Close", symbol).ok_or(SignalError::SchemaUnresolved)?;
    let volume_idx =
        resolve_column(table, "Volume", symbol).ok_or(SignalError::SchemaUnresolved)?;

    let close = &table.columns[close_idx].values;
    let volume = &table.columns[volume_idx].values;

    let mut bars = Vec::with_capacity(table.timestamps.len());
    for (i, timestamp) in table.timestamps.iter().enumerate() {
        let c = close.get(i).copied().flatten();
        let v = volume.get(i).copied().flatten();
        if let (Some(close), Some(volume)) = (c, v) {
            bars.push(Bar {
                timestamp: *timestamp,
                close,
                volume,
            });
        }
    }

    if bars.is_empty() {
        return Err(SignalError::NoData);
    }
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(i: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap()
    }

    fn table(keys_and_values: Vec<(ColumnKey, Vec<Option<f64>>)>, rows: usize) -> RawTable {
        RawTable {
            timestamps: (0..rows as i64).map(ts).collect(),
            columns: keys_and_values
                .into_iter()
                .map(|(key, values)| RawColumn { key, values })
                .collect(),
        }
    }

    #[test]
    fn flat_close_and_volume_resolve() {
        let t = table(
            vec![
                (ColumnKey::Flat("Close".into()), vec![Some(1.0), Some(2.0)]),
                (ColumnKey::Flat("Volume".into()), vec![Some(10.0), Some(20.0)]),
            ],
            2,
        );
        let bars = extract_bars(&t, "AAPL").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 2.0);
        assert_eq!(bars[1].volume, 20.0);
    }

    #[test]
    fn adj_close_fallback_applies_to_close_only() {
        let t = table(
            vec![
                (ColumnKey::Flat("Adj Close".into()), vec![Some(5.0)]),
                (ColumnKey::Flat("Volume".into()), vec![Some(50.0)]),
            ],
            1,
        );
        let bars = extract_bars(&t, "AAPL").unwrap();
        assert_eq!(bars[0].close, 5.0);

        // no "Adj Volume" style fallback exists
        let t = table(
            vec![
                (ColumnKey::Flat("Close".into()), vec![Some(5.0)]),
                (ColumnKey::Flat("Adj Volume".into()), vec![Some(50.0)]),
            ],
            1,
        );
        assert_eq!(extract_bars(&t, "AAPL"), Err(SignalError::SchemaUnresolved));
    }

    #[test]
    fn exact_close_wins_over_adjusted() {
        let t = table(
            vec![
                (ColumnKey::Flat("Adj Close".into()), vec![Some(9.0)]),
                (ColumnKey::Flat("Close".into()), vec![Some(1.0)]),
                (ColumnKey::Flat("Volume".into()), vec![Some(10.0)]),
            ],
            1,
        );
        let bars = extract_bars(&t, "AAPL").unwrap();
        assert_eq!(bars[0].close, 1.0);
    }

    #[test]
    fn symbol_field_pairs_resolve() {
        let t = table(
            vec![
                (
                    ColumnKey::Pair("AAPL".into(), "Close".into()),
                    vec![Some(1.0), Some(2.0)],
                ),
                (
                    ColumnKey::Pair("AAPL".into(), "Volume".into()),
                    vec![Some(10.0), Some(20.0)],
                ),
            ],
            2,
        );
        let bars = extract_bars(&t, "AAPL").unwrap();
        assert_eq!(bars.len(), 2);
    }

    #[test]
    fn reversed_pair_order_resolves_identically() {
        let forward = table(
            vec![
                (
                    ColumnKey::Pair("AAPL".into(), "Close".into()),
                    vec![Some(1.0), Some(2.0)],
                ),
                (
                    ColumnKey::Pair("AAPL".into(), "Volume".into()),
                    vec![Some(10.0), Some(20.0)],
                ),
            ],
            2,
        );
        let reversed = table(
            vec![
                (
                    ColumnKey::Pair("Close".into(), "AAPL".into()),
                    vec![Some(1.0), Some(2.0)],
                ),
                (
                    ColumnKey::Pair("Volume".into(), "AAPL".into()),
                    vec![Some(10.0), Some(20.0)],
                ),
            ],
            2,
        );
        assert_eq!(
            extract_bars(&forward, "AAPL").unwrap(),
            extract_bars(&reversed, "AAPL").unwrap()
        );
    }

    #[test]
    fn loose_pair_match_takes_first_candidate() {
        // keys carry a foreign symbol; the field component still matches
        let t = table(
            vec![
                (
                    ColumnKey::Pair("close".into(), "MSFT".into()),
                    vec![Some(3.0)],
                ),
                (
                    ColumnKey::Pair("volume".into(), "MSFT".into()),
                    vec![Some(30.0)],
                ),
            ],
            1,
        );
        let bars = extract_bars(&t, "AAPL").unwrap();
        assert_eq!(bars[0].close, 3.0);
        assert_eq!(bars[0].volume, 30.0);
    }

    #[test]
    fn incomplete_rows_are_dropped_not_interpolated() {
        let t = table(
            vec![
                (
                    ColumnKey::Flat("Close".into()),
                    vec![Some(1.0), None, Some(3.0), Some(4.0)],
                ),
                (
                    ColumnKey::Flat("Volume".into()),
                    vec![Some(10.0), Some(20.0), None, Some(40.0)],
                ),
            ],
            4,
        );
        let bars = extract_bars(&t, "AAPL").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 1.0);
        assert_eq!(bars[1].close, 4.0);
    }

    #[test]
    fn empty_table_is_no_data() {
        assert_eq!(
            extract_bars(&RawTable::default(), "AAPL"),
            Err(SignalError::NoData)
        );
    }

    #[test]
    fn all_rows_dropped_is_no_data() {
        let t = table(
            vec![
                (ColumnKey::Flat("Close".into()), vec![None, None]),
                (ColumnKey::Flat("Volume".into()), vec![Some(1.0), Some(2.0)]),
            ],
            2,
        );
        assert_eq!(extract_bars(&t, "AAPL"), Err(SignalError::NoData));
    }

    #[test]
    fn unresolvable_columns_are_schema_errors() {
        let t = table(
            vec![(ColumnKey::Flat("Open".into()), vec![Some(1.0)])],
            1,
        );
        assert_eq!(extract_bars(&t, "AAPL"), Err(SignalError::SchemaUnresolved));
    }
}
