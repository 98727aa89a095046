//! Symbol-roster collaborator: named universes and user-entered lists.

use thiserror::Error;

const NASDAQ_100_URL: &str =
    "https://datahub.io/core/nasdaq-100-companies/r/constituents.csv";
const SP500_URL: &str =
    "https://datahub.io/core/s-and-p-500-companies/r/constituents.csv";
const NASDAQ_LISTED_URL: &str =
    "https://datahub.io/core/nasdaq-listings/r/nasdaq-listed-symbols.csv";

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),

    #[error("no Symbol column in roster csv")]
    MissingSymbolColumn,
}

/// Selectable symbol universes, as offered by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Universe {
    #[default]
    Custom,
    Nasdaq100,
    Sp500,
    NasdaqAll,
}

impl Universe {
    pub fn label(&self) -> &'static str {
        match self {
            Universe::Custom => "Custom list",
            Universe::Nasdaq100 => "NASDAQ-100",
            Universe::Sp500 => "S&P 500",
            Universe::NasdaqAll => "Full NASDAQ",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Universe::Custom => Universe::Nasdaq100,
            Universe::Nasdaq100 => Universe::Sp500,
            Universe::Sp500 => Universe::NasdaqAll,
            Universe::NasdaqAll => Universe::Custom,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "custom" | "list" => Some(Universe::Custom),
            "nasdaq100" | "ndx" => Some(Universe::Nasdaq100),
            "sp500" | "spx" => Some(Universe::Sp500),
            "nasdaq" | "all" => Some(Universe::NasdaqAll),
            _ => None,
        }
    }
}

/// Downloads constituents lists for the named universes.
pub struct RosterClient {
    client: reqwest::Client,
}

impl RosterClient {
    pub fn new(timeout: std::time::Duration) -> Result<Self, RosterError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rvol-monitor/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Returns the raw ticker list for a universe. `Custom` has no remote
    /// roster and resolves to an empty list; the driver supplies the
    /// user's own symbols instead.
    pub async fn load(&self, universe: Universe) -> Result<Vec<String>, RosterError> {
        let url = match universe {
            Universe::Custom => return Ok(Vec::new()),
            Universe::Nasdaq100 => NASDAQ_100_URL,
            Universe::Sp500 => SP500_URL,
            Universe::NasdaqAll => NASDAQ_LISTED_URL,
        };

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(RosterError::Status(response.status()));
        }
        let body = response.text().await?;
        parse_symbol_column(&body).ok_or(RosterError::MissingSymbolColumn)
    }
}

// The datahub constituents files are plain unquoted csv, so a field split
// is enough; no need to drag in a csv parser for one column.
fn parse_symbol_column(csv: &str) -> Option<Vec<String>> {
    let mut lines = csv.lines();
    let header = lines.next()?;
    let column = header
        .split(',')
        .position(|name| name.trim().eq_ignore_ascii_case("symbol"))?;

    let symbols = lines
        .filter_map(|line| line.split(',').nth(column))
        .map(|field| field.trim().to_string())
        .filter(|field| !field.is_empty())
        .collect();
    Some(symbols)
}

/// Splits a user-entered comma list, as typed into the custom-universe
/// input.
pub fn parse_custom_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_column_is_found_by_header() {
        let csv = "Symbol,Name,Sector\nAAPL,Apple Inc.,Technology\nTSLA,Tesla,Consumer\n";
        assert_eq!(parse_symbol_column(csv).unwrap(), vec!["AAPL", "TSLA"]);
    }

    #[test]
    fn symbol_column_position_does_not_matter() {
        let csv = "Company Name,symbol\nApple Inc.,AAPL\n,\nTesla,TSLA\n";
        assert_eq!(parse_symbol_column(csv).unwrap(), vec!["AAPL", "TSLA"]);
    }

    #[test]
    fn missing_symbol_column_is_an_error() {
        let csv = "Ticker,Name\nAAPL,Apple Inc.\n";
        assert!(parse_symbol_column(csv).is_none());
    }

    #[test]
    fn custom_list_splits_on_commas() {
        assert_eq!(
            parse_custom_list(" aapl, TSLA ,,amd "),
            vec!["aapl", "TSLA", "amd"]
        );
        assert!(parse_custom_list("  ").is_empty());
    }

    #[test]
    fn universe_names_parse() {
        assert_eq!(Universe::parse("sp500"), Some(Universe::Sp500));
        assert_eq!(Universe::parse("NASDAQ100"), Some(Universe::Nasdaq100));
        assert_eq!(Universe::parse("nonsense"), None);
    }
}
