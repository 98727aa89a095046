pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod monitor;
pub mod report;
pub mod roster;
pub mod rvol;
pub mod scanner;
pub mod tui;
pub mod types;

pub use config::Config;
pub use error::SignalError;
pub use fetch::{BarFetcher, ChartClient, ChartQuery};
pub use monitor::{run_monitor_cycle_once, CycleReport, MonitorSet};
pub use roster::{RosterClient, Universe};
pub use scanner::{run_scan_once, ScanOutcome, ScanParams};
pub use types::{Bar, MonitorRow, RvolReading, ScanResult, Snapshot, Trend};
