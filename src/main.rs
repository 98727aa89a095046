use anyhow::Result;
use rvol_monitor::report::print_scan_report;
use rvol_monitor::roster::{parse_custom_list, Universe};
use rvol_monitor::tui::{run_tui, App};
use rvol_monitor::{run_scan_once, ChartClient, Config, RosterClient};
use std::fs::File;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Log to file, not the terminal, so the TUI stays intact
    let log_file = File::create("rvol-monitor.log").unwrap_or_else(|_| {
        // Fallback: if we can't create the file, just disable file logging
        File::open(if cfg!(windows) { "NUL" } else { "/dev/null" }).unwrap()
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(log_file))
                .with_ansi(false),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let fetcher = match ChartClient::new(config.fetch_timeout()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to build the chart client: {}", e);
            std::process::exit(1);
        }
    };
    let roster = match RosterClient::new(config.fetch_timeout()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to build the roster client: {}", e);
            std::process::exit(1);
        }
    };

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        // `rvol-monitor scan [universe-or-list]` runs one scan and prints
        // the table without entering the TUI
        Some("scan") => {
            let target = args.next();
            run_headless_scan(&config, &fetcher, &roster, target.as_deref()).await
        }
        Some(other) => {
            eprintln!("Unknown argument: {}", other);
            eprintln!("Usage: rvol-monitor [scan [universe-or-symbol-list]]");
            std::process::exit(2);
        }
        None => {
            let app = App::new(config, fetcher, roster);
            run_tui(app).await
        }
    }
}

async fn run_headless_scan(
    config: &Config,
    fetcher: &ChartClient,
    roster: &RosterClient,
    target: Option<&str>,
) -> Result<()> {
    let symbols = match target {
        Some(target) => match Universe::parse(target) {
            Some(universe) => {
                tracing::info!(universe = universe.label(), "loading roster");
                roster.load(universe).await?
            }
            // not a universe name, treat it as a comma-separated list
            None => parse_custom_list(target),
        },
        None => parse_custom_list("AAPL,TSLA,AMD,NIO,PLTR"),
    };
    if symbols.is_empty() {
        anyhow::bail!("no symbols to scan");
    }

    let capped: Vec<String> = symbols.into_iter().take(config.max_symbols).collect();
    tracing::info!(count = capped.len(), "starting scan");

    let outcome = run_scan_once(
        fetcher,
        &capped,
        &config.scan_query(),
        &config.scan_params(),
    )
    .await;
    print_scan_report(&outcome);
    Ok(())
}
