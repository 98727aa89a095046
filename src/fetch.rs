//! Market-data collaborator: the fetch seam plus the public chart client.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::extract::{ColumnKey, RawColumn, RawTable};

const CHART_API_BASE: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed chart payload: {0}")]
    Payload(String),

    #[error("no data for any candidate interval")]
    Empty,
}

/// Sampling interval of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    OneMinute,
    FiveMinutes,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
        }
    }
}

/// Window and interval preferences for one fetch call.
#[derive(Debug, Clone)]
pub struct ChartQuery {
    pub window_days: i64,
    pub intervals: Vec<Interval>,
}

impl ChartQuery {
    /// Intraday query preferring 1m bars, falling back to 5m. Upstream
    /// does not reliably serve 1m for every listing.
    pub fn intraday(window_days: i64) -> Self {
        Self {
            window_days,
            intervals: vec![Interval::OneMinute, Interval::FiveMinutes],
        }
    }
}

/// The seam between the signal core and whatever serves the bars. Tests
/// stub this; production uses [`ChartClient`].
#[async_trait]
pub trait BarFetcher {
    async fn fetch_bars(&self, symbol: &str, query: &ChartQuery) -> Result<RawTable, FetchError>;
}

// Wire shape of the v8 chart endpoint, fields we consume only.
#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartNode,
}

#[derive(Debug, Deserialize)]
struct ChartNode {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Vec<AdjCloseBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Intraday bar client for the public chart endpoint.
pub struct ChartClient {
    client: reqwest::Client,
}

impl ChartClient {
    pub fn new(timeout: std::time::Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rvol-monitor/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn fetch_interval(
        &self,
        symbol: &str,
        interval: Interval,
        window_days: i64,
    ) -> Result<RawTable, FetchError> {
        let end = Utc::now();
        let start = end - Duration::days(window_days);
        let url = format!(
            "{}/{}?period1={}&period2={}&interval={}&includePrePost=false",
            CHART_API_BASE,
            symbol,
            start.timestamp(),
            end.timestamp(),
            interval.as_str()
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let envelope: ChartEnvelope = response.json().await?;
        if let Some(err) = envelope.chart.error {
            return Err(FetchError::Payload(format!(
                "{}: {}",
                err.code, err.description
            )));
        }
        let result = envelope
            .chart
            .result
            .and_then(|mut results| {
                if results.is_empty() {
                    None
                } else {
                    Some(results.remove(0))
                }
            })
            .ok_or_else(|| FetchError::Payload("empty result set".to_string()))?;

        Ok(into_table(result))
    }
}

#[async_trait]
impl BarFetcher for ChartClient {
    /// Tries each preferred interval in order and returns the first
    /// non-empty table.
    async fn fetch_bars(&self, symbol: &str, query: &ChartQuery) -> Result<RawTable, FetchError> {
        let mut last_err = FetchError::Empty;
        for interval in &query.intervals {
            match self
                .fetch_interval(symbol, *interval, query.window_days)
                .await
            {
                Ok(table) if !table.is_empty() => return Ok(table),
                Ok(_) => last_err = FetchError::Empty,
                Err(err) => {
                    tracing::debug!(
                        %symbol,
                        interval = interval.as_str(),
                        error = %err,
                        "interval fetch failed"
                    );
                    last_err = err;
                }
            }
        }
        Err(last_err)
    }
}

fn into_table(result: ChartResult) -> RawTable {
    let timestamps = result
        .timestamp
        .unwrap_or_default()
        .into_iter()
        .filter_map(|secs| Utc.timestamp_opt(secs, 0).single())
        .collect();

    let mut columns = Vec::new();
    if let Some(quote) = result.indicators.quote.into_iter().next() {
        columns.push(RawColumn {
            key: ColumnKey::Flat("Close".to_string()),
            values: quote.close,
        });
        columns.push(RawColumn {
            key: ColumnKey::Flat("Volume".to_string()),
            values: quote.volume,
        });
    }
    if let Some(adj) = result.indicators.adjclose.into_iter().next() {
        columns.push(RawColumn {
            key: ColumnKey::Flat("Adj Close".to_string()),
            values: adj.adjclose,
        });
    }

    RawTable {
        timestamps,
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_payload_becomes_a_flat_table() {
        let raw = serde_json::json!({
            "chart": {
                "result": [{
                    "timestamp": [1700000000i64, 1700000060i64],
                    "indicators": {
                        "quote": [{
                            "close": [10.5, null],
                            "volume": [1200, 1400]
                        }],
                        "adjclose": [{ "adjclose": [10.4, 10.6] }]
                    }
                }],
                "error": null
            }
        });
        let envelope: ChartEnvelope = serde_json::from_value(raw).unwrap();
        let result = envelope.chart.result.unwrap().remove(0);
        let table = into_table(result);

        assert_eq!(table.timestamps.len(), 2);
        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.columns[0].key, ColumnKey::Flat("Close".to_string()));
        assert_eq!(table.columns[0].values, vec![Some(10.5), None]);
        assert_eq!(table.columns[1].values, vec![Some(1200.0), Some(1400.0)]);
        assert_eq!(
            table.columns[2].key,
            ColumnKey::Flat("Adj Close".to_string())
        );
    }

    #[test]
    fn api_error_payloads_deserialize() {
        let raw = serde_json::json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found" }
            }
        });
        let envelope: ChartEnvelope = serde_json::from_value(raw).unwrap();
        let err = envelope.chart.error.unwrap();
        assert_eq!(err.code, "Not Found");
    }

    #[test]
    fn intraday_query_prefers_one_minute_bars() {
        let query = ChartQuery::intraday(7);
        assert_eq!(query.intervals[0], Interval::OneMinute);
        assert_eq!(query.intervals[1], Interval::FiveMinutes);
        assert_eq!(query.window_days, 7);
    }
}
