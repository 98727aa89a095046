//! Relative-volume computation.

use crate::error::SignalError;
use crate::types::{Bar, RvolReading};

/// Computes the RVOL reading for a bar series.
///
/// Needs at least `lookback + 1` bars. The trailing average covers the
/// `lookback` bars immediately before the most recent one; the current bar
/// never contributes to its own baseline. A `lookback` of zero averages
/// every bar except the last.
pub fn compute(symbol: &str, bars: &[Bar], lookback: usize) -> Result<RvolReading, SignalError> {
    let need = lookback + 1;
    if bars.len() < need {
        return Err(SignalError::InsufficientHistory {
            have: bars.len(),
            need,
        });
    }

    let last = bars[bars.len() - 1];
    let trailing = if lookback == 0 {
        &bars[..bars.len() - 1]
    } else {
        &bars[bars.len() - 1 - lookback..bars.len() - 1]
    };

    let avg_volume = if trailing.is_empty() {
        0.0
    } else {
        trailing.iter().map(|b| b.volume).sum::<f64>() / trailing.len() as f64
    };
    if avg_volume <= 0.0 {
        return Err(SignalError::ZeroTrailingVolume);
    }

    let pct_change = if bars.len() >= 2 {
        let prev_close = bars[bars.len() - 2].close;
        (last.close - prev_close) / prev_close * 100.0
    } else {
        0.0
    };

    Ok(RvolReading {
        symbol: symbol.to_string(),
        current_price: last.close,
        current_volume: last.volume,
        avg_volume,
        rvol: last.volume / avg_volume,
        pct_change,
    })
}

/// Monitor-mode variant: clamps the window to whatever history exists, so
/// a watched symbol with a thin series still yields a reading instead of
/// dropping off the table. Scanning stays on the strict [`compute`].
pub fn compute_adaptive(
    symbol: &str,
    bars: &[Bar],
    lookback: usize,
) -> Result<RvolReading, SignalError> {
    if bars.len() < 2 {
        return Err(SignalError::InsufficientHistory {
            have: bars.len(),
            need: 2,
        });
    }
    let effective = lookback.min(bars.len() - 1);
    compute(symbol, bars, effective)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bars(volumes: &[f64], closes: &[f64]) -> Vec<Bar> {
        assert_eq!(volumes.len(), closes.len());
        volumes
            .iter()
            .zip(closes)
            .enumerate()
            .map(|(i, (&volume, &close))| Bar {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 60, 0).unwrap(),
                close,
                volume,
            })
            .collect()
    }

    #[test]
    fn rvol_is_exactly_k_for_flat_trailing_volume() {
        // lookback + 1 bars, trailing volume all v, last bar k * v
        let series = bars(
            &[100.0, 100.0, 100.0, 100.0, 350.0],
            &[10.0, 10.0, 10.0, 10.0, 10.0],
        );
        let reading = compute("TEST", &series, 4).unwrap();
        assert_eq!(reading.rvol, 3.5);
        assert_eq!(reading.avg_volume, 100.0);
    }

    #[test]
    fn average_never_includes_the_current_bar() {
        // including the 900.0 spike in its own average would give
        // avg = (100 + 100 + 900) / 3 = 366.67 and rvol ≈ 2.45
        let series = bars(&[50.0, 100.0, 100.0, 900.0], &[1.0, 1.0, 1.0, 1.0]);
        let reading = compute("TEST", &series, 2).unwrap();
        assert_eq!(reading.avg_volume, 100.0);
        assert_eq!(reading.rvol, 9.0);
    }

    #[test]
    fn lookback_window_is_the_bars_immediately_preceding() {
        // lookback 2 over [.., 200, 400, 800]: avg = (200 + 400) / 2
        let series = bars(&[9_999.0, 200.0, 400.0, 800.0], &[1.0, 1.0, 1.0, 1.0]);
        let reading = compute("TEST", &series, 2).unwrap();
        assert_eq!(reading.avg_volume, 300.0);
    }

    #[test]
    fn zero_lookback_averages_all_prior_bars() {
        let series = bars(&[100.0, 300.0, 400.0], &[1.0, 1.0, 1.0]);
        let reading = compute("TEST", &series, 0).unwrap();
        assert_eq!(reading.avg_volume, 200.0);
        assert_eq!(reading.rvol, 2.0);
    }

    #[test]
    fn short_history_is_reported_not_zeroed() {
        let series = bars(&[100.0, 100.0], &[1.0, 1.0]);
        assert_eq!(
            compute("TEST", &series, 5),
            Err(SignalError::InsufficientHistory { have: 2, need: 6 })
        );
    }

    #[test]
    fn zero_trailing_volume_is_reported() {
        let series = bars(&[0.0, 0.0, 500.0], &[1.0, 1.0, 1.0]);
        assert_eq!(
            compute("TEST", &series, 2),
            Err(SignalError::ZeroTrailingVolume)
        );
    }

    #[test]
    fn pct_change_compares_last_two_closes() {
        let series = bars(&[100.0, 100.0, 100.0], &[10.0, 8.0, 10.0]);
        let reading = compute("TEST", &series, 2).unwrap();
        assert_eq!(reading.pct_change, 25.0);
        assert_eq!(reading.current_price, 10.0);
    }

    #[test]
    fn adaptive_clamps_to_available_history() {
        // only 3 bars for a configured lookback of 50
        let series = bars(&[100.0, 200.0, 600.0], &[1.0, 1.0, 1.0]);
        let reading = compute_adaptive("TEST", &series, 50).unwrap();
        assert_eq!(reading.avg_volume, 150.0);
        assert_eq!(reading.rvol, 4.0);
    }

    #[test]
    fn adaptive_still_needs_two_bars() {
        let series = bars(&[100.0], &[1.0]);
        assert_eq!(
            compute_adaptive("TEST", &series, 50),
            Err(SignalError::InsufficientHistory { have: 1, need: 2 })
        );
    }
}
