//! One-shot scan output for the terminal, outside the TUI.

use colored::*;

use crate::scanner::ScanOutcome;
use crate::types::round_display;

// Skip reports are capped so a broad-universe scan does not flood the
// terminal with delisted tickers.
const MAX_SKIP_LINES: usize = 20;

/// Prints a ranked scan as a colored table.
pub fn print_scan_report(outcome: &ScanOutcome) {
    println!();
    println!("{}", "=".repeat(70).bright_cyan());
    println!("{}", "  RVOL Breakout Scan".bright_cyan().bold());
    println!("{}", "=".repeat(70).bright_cyan());
    println!();

    if outcome.results.is_empty() {
        println!(
            "{}",
            "No hits. Loosen the filters or widen the universe.".yellow()
        );
    } else {
        println!(
            "{}",
            format!(
                "{:<8} {:>12} {:>10} {:>8} {:>13} {:>13}",
                "Symbol", "Price", "%Chg", "RVOL", "Volume", "AvgVol"
            )
            .bold()
        );
        for hit in &outcome.results {
            let pct = round_display(hit.pct_change, 3);
            let pct_cell = format!("{:>10}", format!("{:+.3}%", pct));
            let pct_cell = if pct > 0.0 {
                pct_cell.green()
            } else if pct < 0.0 {
                pct_cell.red()
            } else {
                pct_cell.normal()
            };

            println!(
                "{} {:>12} {} {:>8} {:>13} {:>13}",
                format!("{:<8}", hit.symbol).cyan().bold(),
                format!("${:.4}", round_display(hit.price, 4)),
                pct_cell,
                format!("{:.2}x", round_display(hit.rvol, 2)),
                hit.current_volume as u64,
                hit.avg_volume as u64,
            );
        }
        println!();
        println!(
            "{} {}",
            "Hits:".green().bold(),
            outcome.results.len().to_string().green()
        );
    }

    if !outcome.skipped.is_empty() {
        println!();
        println!(
            "{} {}",
            "Skipped:".yellow().bold(),
            outcome.skipped.len().to_string().yellow()
        );
        for skip in outcome.skipped.iter().take(MAX_SKIP_LINES) {
            println!("  {} {}", format!("{:<8}", skip.symbol).yellow(), skip.reason);
        }
        if outcome.skipped.len() > MAX_SKIP_LINES {
            println!("  ... and {} more", outcome.skipped.len() - MAX_SKIP_LINES);
        }
    }
    println!();
}
