use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::Config;
use crate::fetch::ChartClient;
use crate::monitor::{self, MonitorSet};
use crate::roster::{self, RosterClient, Universe};
use crate::scanner;
use crate::types::{MonitorRow, ScanResult, SkippedSymbol};

const DEFAULT_CUSTOM_SYMBOLS: &str = "AAPL,TSLA,AMD,NIO,PLTR";

/// Available tabs in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Scanner,
    Monitor,
    Logs,
}

impl Tab {
    pub fn next(&self) -> Self {
        match self {
            Tab::Scanner => Tab::Monitor,
            Tab::Monitor => Tab::Logs,
            Tab::Logs => Tab::Scanner,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Tab::Scanner => Tab::Logs,
            Tab::Monitor => Tab::Scanner,
            Tab::Logs => Tab::Monitor,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Scanner => "Scanner",
            Tab::Monitor => "Monitor",
            Tab::Logs => "Logs",
        }
    }

    pub fn all() -> [Tab; 3] {
        [Tab::Scanner, Tab::Monitor, Tab::Logs]
    }
}

/// Input mode for command entry and confirmation modals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
    QuitConfirmation,
    RemoveConfirmation,
}

/// Yes/no selection inside a confirmation modal. Defaults to No.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirm {
    No,
    Yes,
}

impl Confirm {
    fn toggle(self) -> Self {
        match self {
            Confirm::No => Confirm::Yes,
            Confirm::Yes => Confirm::No,
        }
    }
}

/// Log entry for the logs tab.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
}

/// Main application state.
pub struct App {
    pub config: Config,
    fetcher: ChartClient,
    roster: RosterClient,

    pub current_tab: Tab,
    pub should_quit: bool,
    pub logs: Vec<LogEntry>,

    // Command input and modals
    pub input_mode: InputMode,
    pub command_input: String,
    pub quit_selection: Confirm,
    pub remove_selection: Confirm,

    // Scanner
    pub universe: Universe,
    pub custom_symbols: String,
    roster_cache: Vec<String>,
    pub scan_results: Vec<ScanResult>,
    pub scan_skipped: usize,
    pub selected_result: usize,
    pub last_scan_at: Option<DateTime<Utc>>,

    // Monitor
    pub watchlist: MonitorSet,
    pub monitor_rows: Vec<MonitorRow>,
    pub monitor_skipped: Vec<SkippedSymbol>,
    pub selected_watch: usize,
    last_cycle: Option<Instant>,
}

impl App {
    pub fn new(config: Config, fetcher: ChartClient, roster: RosterClient) -> Self {
        let mut app = Self {
            config,
            fetcher,
            roster,
            current_tab: Tab::Scanner,
            should_quit: false,
            logs: Vec::new(),
            input_mode: InputMode::Normal,
            command_input: String::new(),
            quit_selection: Confirm::No,
            remove_selection: Confirm::No,
            universe: Universe::Custom,
            custom_symbols: DEFAULT_CUSTOM_SYMBOLS.to_string(),
            roster_cache: Vec::new(),
            scan_results: Vec::new(),
            scan_skipped: 0,
            selected_result: 0,
            last_scan_at: None,
            watchlist: MonitorSet::new(),
            monitor_rows: Vec::new(),
            monitor_skipped: Vec::new(),
            selected_watch: 0,
            last_cycle: None,
        };

        app.add_log(LogLevel::Info, "TUI initialized");
        app.add_log(LogLevel::Info, "Press 's' to scan, ':' for command mode");
        app.add_log(
            LogLevel::Info,
            "Promote scan hits with Enter, then watch them on the Monitor tab",
        );
        app
    }

    pub fn add_log(&mut self, level: LogLevel, message: &str) {
        let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
        self.logs.push(LogEntry {
            timestamp,
            level,
            message: message.to_string(),
        });

        // Keep only last 100 logs
        if self.logs.len() > 100 {
            self.logs.remove(0);
        }
    }

    /// Seconds until the next automatic monitor cycle, for the header.
    pub fn next_refresh_in(&self) -> Option<u64> {
        if self.watchlist.is_empty() {
            return None;
        }
        let interval = self.config.refresh_interval();
        match self.last_cycle {
            None => Some(0),
            Some(at) => Some(interval.saturating_sub(at.elapsed()).as_secs()),
        }
    }

    /// Called on every tick: runs a monitor cycle whenever the refresh
    /// interval has elapsed, regardless of the visible tab.
    pub async fn refresh_data(&mut self) {
        if self.watchlist.is_empty() {
            return;
        }
        let due = match self.last_cycle {
            None => true,
            Some(at) => at.elapsed() >= self.config.refresh_interval(),
        };
        if due {
            self.run_monitor_cycle().await;
        }
    }

    async fn run_monitor_cycle(&mut self) {
        let report = monitor::run_monitor_cycle_once(
            &mut self.watchlist,
            &self.fetcher,
            &self.config.monitor_query(),
            self.config.lookback,
            self.config.fetch_concurrency,
            Utc::now(),
        )
        .await;
        self.last_cycle = Some(Instant::now());

        if !report.skipped.is_empty() {
            self.add_log(
                LogLevel::Warning,
                &format!("{} symbol(s) had no data this cycle", report.skipped.len()),
            );
        }
        self.monitor_rows = report.rows;
        self.monitor_skipped = report.skipped;
        self.clamp_watch_selection();
    }

    async fn run_scan(&mut self) {
        let symbols = match self.resolve_scan_universe().await {
            Some(symbols) => symbols,
            None => return,
        };
        if symbols.is_empty() {
            self.add_log(
                LogLevel::Warning,
                "No symbols to scan. Set a custom list with /symbols or pick a universe with /source",
            );
            return;
        }

        let capped: Vec<String> = symbols
            .into_iter()
            .take(self.config.max_symbols)
            .collect();
        self.add_log(
            LogLevel::Info,
            &format!(
                "Scanning {} symbols from {}...",
                capped.len(),
                self.universe.label()
            ),
        );

        let outcome = scanner::run_scan_once(
            &self.fetcher,
            &capped,
            &self.config.scan_query(),
            &self.config.scan_params(),
        )
        .await;

        self.add_log(
            LogLevel::Success,
            &format!(
                "Scan finished: {} hit(s), {} skipped",
                outcome.results.len(),
                outcome.skipped.len()
            ),
        );
        self.scan_results = outcome.results;
        self.scan_skipped = outcome.skipped.len();
        self.selected_result = 0;
        self.last_scan_at = Some(Utc::now());
        self.current_tab = Tab::Scanner;
    }

    async fn resolve_scan_universe(&mut self) -> Option<Vec<String>> {
        if self.universe == Universe::Custom {
            return Some(roster::parse_custom_list(&self.custom_symbols));
        }
        if !self.roster_cache.is_empty() {
            return Some(self.roster_cache.clone());
        }
        self.add_log(
            LogLevel::Info,
            &format!("Loading {} roster...", self.universe.label()),
        );
        match self.roster.load(self.universe).await {
            Ok(symbols) => {
                self.add_log(
                    LogLevel::Success,
                    &format!("{} loaded ({} symbols)", self.universe.label(), symbols.len()),
                );
                self.roster_cache = symbols;
                Some(self.roster_cache.clone())
            }
            Err(e) => {
                self.add_log(
                    LogLevel::Error,
                    &format!("Failed to load {}: {}", self.universe.label(), e),
                );
                None
            }
        }
    }

    fn set_universe(&mut self, universe: Universe) {
        if self.universe != universe {
            self.universe = universe;
            self.roster_cache.clear();
        }
        self.add_log(
            LogLevel::Info,
            &format!("Symbol source: {}", universe.label()),
        );
    }

    /// Promotes the selected scan hit into the watchlist.
    fn promote_selected(&mut self) {
        let Some(hit) = self.scan_results.get(self.selected_result) else {
            return;
        };
        let symbol = hit.symbol.clone();
        match self.watchlist.add(&symbol) {
            Ok(true) => {
                self.add_log(LogLevel::Success, &format!("Watching {}", symbol));
                // next due tick picks it up immediately
                self.last_cycle = None;
            }
            Ok(false) => {
                self.add_log(LogLevel::Warning, &format!("{} is already watched", symbol));
            }
            Err(e) => self.add_log(LogLevel::Error, &format!("{}", e)),
        }
    }

    fn remove_selected_watch(&mut self) {
        let Some(row) = self.monitor_rows.get(self.selected_watch) else {
            return;
        };
        let symbol = row.symbol.clone();
        if self.watchlist.remove(&symbol) {
            self.monitor_rows.retain(|r| r.symbol != symbol);
            self.add_log(LogLevel::Info, &format!("Stopped watching {}", symbol));
        }
        self.clamp_watch_selection();
    }

    fn clamp_watch_selection(&mut self) {
        if self.selected_watch >= self.monitor_rows.len() {
            self.selected_watch = self.monitor_rows.len().saturating_sub(1);
        }
    }

    pub async fn handle_event(&mut self, event: KeyEvent) -> Result<()> {
        match self.input_mode {
            InputMode::Command => self.handle_command_input(event).await,
            InputMode::QuitConfirmation => self.handle_quit_confirmation(event),
            InputMode::RemoveConfirmation => self.handle_remove_confirmation(event),
            InputMode::Normal => self.handle_normal_input(event).await,
        }
    }

    async fn handle_command_input(&mut self, event: KeyEvent) -> Result<()> {
        match event.code {
            KeyCode::Enter => {
                let command = self.command_input.clone();
                self.command_input.clear();
                self.input_mode = InputMode::Normal;
                self.execute_command(&command).await;
            }
            KeyCode::Esc => {
                self.command_input.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.command_input.pop();
            }
            KeyCode::Char(c) => {
                self.command_input.push(c);
            }
            _ => {}
        }
        Ok(())
    }

    async fn execute_command(&mut self, command: &str) {
        let parts: Vec<&str> = command.trim().split_whitespace().collect();
        if parts.is_empty() {
            return;
        }

        let cmd = parts[0].trim_start_matches('/').to_lowercase();
        let args: Vec<&str> = parts[1..].to_vec();

        match cmd.as_str() {
            "scan" | "s" => self.run_scan().await,
            "source" | "src" => match args.first().and_then(|name| Universe::parse(name)) {
                Some(universe) => self.set_universe(universe),
                None => self.add_log(
                    LogLevel::Warning,
                    "Usage: /source <custom|nasdaq100|sp500|nasdaq>",
                ),
            },
            "symbols" | "sym" => {
                if args.is_empty() {
                    self.add_log(LogLevel::Warning, "Usage: /symbols AAPL,TSLA,...");
                } else {
                    self.custom_symbols = args.join(",");
                    self.set_universe(Universe::Custom);
                }
            }
            "add" | "a" => {
                if args.is_empty() {
                    self.add_log(LogLevel::Warning, "Usage: /add <symbol> [symbol...]");
                } else {
                    for arg in args {
                        for entry in roster::parse_custom_list(arg) {
                            match self.watchlist.add(&entry) {
                                Ok(true) => {
                                    self.add_log(
                                        LogLevel::Success,
                                        &format!("Watching {}", entry.to_ascii_uppercase()),
                                    );
                                    self.last_cycle = None;
                                }
                                Ok(false) => self.add_log(
                                    LogLevel::Warning,
                                    &format!("{} is already watched", entry.to_ascii_uppercase()),
                                ),
                                Err(e) => {
                                    self.add_log(LogLevel::Error, &format!("{}", e));
                                }
                            }
                        }
                    }
                }
            }
            "remove" | "rm" => match args.first() {
                Some(symbol) => {
                    if self.watchlist.remove(symbol) {
                        let symbol = symbol.to_ascii_uppercase();
                        self.monitor_rows.retain(|r| r.symbol != symbol);
                        self.clamp_watch_selection();
                        self.add_log(LogLevel::Info, &format!("Stopped watching {}", symbol));
                    } else {
                        self.add_log(
                            LogLevel::Warning,
                            &format!("Not watching {}", symbol.to_ascii_uppercase()),
                        );
                    }
                }
                None => self.add_log(LogLevel::Warning, "Usage: /remove <symbol>"),
            },
            "watchlist" | "wl" => {
                if args.is_empty() {
                    self.add_log(LogLevel::Warning, "Usage: /watchlist AAPL,TSLA,...");
                } else {
                    let entries = roster::parse_custom_list(&args.join(","));
                    let rejected = self.watchlist.replace_all(&entries);
                    for skip in &rejected {
                        self.add_log(LogLevel::Error, &format!("{}: {}", skip.symbol, skip.reason));
                    }
                    self.monitor_rows.clear();
                    self.monitor_skipped.clear();
                    self.selected_watch = 0;
                    self.last_cycle = None;
                    self.add_log(
                        LogLevel::Success,
                        &format!("Watchlist replaced ({} symbols)", self.watchlist.len()),
                    );
                }
            }
            "lookback" => match args.first().and_then(|v| v.parse::<usize>().ok()) {
                Some(n) if n > 0 => {
                    self.config.lookback = n;
                    self.add_log(LogLevel::Info, &format!("Lookback set to {} bars", n));
                }
                _ => self.add_log(LogLevel::Warning, "Usage: /lookback <bars>"),
            },
            "rvol" => match args.first().and_then(|v| v.parse::<f64>().ok()) {
                Some(x) if x > 0.0 => {
                    self.config.min_rvol = x;
                    self.add_log(LogLevel::Info, &format!("Minimum RVOL set to {:.2}", x));
                }
                _ => self.add_log(LogLevel::Warning, "Usage: /rvol <min>"),
            },
            "price" => {
                let min = args.first().and_then(|v| v.parse::<f64>().ok());
                let max = args.get(1).and_then(|v| v.parse::<f64>().ok());
                match (min, max) {
                    (Some(min), Some(max)) if min >= 0.0 && max >= min => {
                        self.config.min_price = min;
                        self.config.max_price = max;
                        self.add_log(
                            LogLevel::Info,
                            &format!("Price range set to ${:.2}..${:.2}", min, max),
                        );
                    }
                    _ => self.add_log(LogLevel::Warning, "Usage: /price <min> <max>"),
                }
            }
            "refresh" => match args.first().and_then(|v| v.parse::<u64>().ok()) {
                Some(secs) if secs > 0 => {
                    self.config.refresh_secs = secs;
                    self.add_log(LogLevel::Info, &format!("Refresh every {}s", secs));
                }
                _ => self.add_log(LogLevel::Warning, "Usage: /refresh <seconds>"),
            },
            "help" | "h" | "?" => self.show_command_help(),
            _ => {
                self.add_log(LogLevel::Warning, &format!("Unknown command: /{}", cmd));
                self.add_log(LogLevel::Info, "Type /help for available commands");
            }
        }
    }

    fn show_command_help(&mut self) {
        self.add_log(LogLevel::Info, "─── Available Commands ───");
        self.add_log(LogLevel::Info, "/scan               - Run a scan now");
        self.add_log(
            LogLevel::Info,
            "/source <name>      - custom | nasdaq100 | sp500 | nasdaq",
        );
        self.add_log(LogLevel::Info, "/symbols A,B,C      - Set the custom list");
        self.add_log(LogLevel::Info, "/add <symbol>       - Watch a symbol");
        self.add_log(LogLevel::Info, "/remove <symbol>    - Stop watching");
        self.add_log(LogLevel::Info, "/watchlist A,B,C    - Replace the watchlist");
        self.add_log(LogLevel::Info, "/lookback <bars>    - Volume average window");
        self.add_log(LogLevel::Info, "/rvol <min>         - Minimum RVOL filter");
        self.add_log(LogLevel::Info, "/price <min> <max>  - Price range filter");
        self.add_log(LogLevel::Info, "/refresh <seconds>  - Monitor refresh rate");
    }

    async fn handle_normal_input(&mut self, event: KeyEvent) -> Result<()> {
        match event.code {
            // Enter command mode
            KeyCode::Char(':') | KeyCode::Char('/') => {
                self.input_mode = InputMode::Command;
                self.command_input = "/".to_string();
            }

            // Run a scan
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.run_scan().await;
            }

            // Cycle the symbol source
            KeyCode::Char('u') | KeyCode::Char('U') => {
                self.set_universe(self.universe.next());
            }

            // Force a monitor refresh
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if self.watchlist.is_empty() {
                    self.add_log(LogLevel::Warning, "Watchlist is empty - nothing to refresh");
                } else {
                    self.run_monitor_cycle().await;
                }
            }

            // Row navigation
            KeyCode::Up | KeyCode::Char('k') => match self.current_tab {
                Tab::Scanner => {
                    self.selected_result = self.selected_result.saturating_sub(1);
                }
                Tab::Monitor => {
                    self.selected_watch = self.selected_watch.saturating_sub(1);
                }
                Tab::Logs => {}
            },
            KeyCode::Down | KeyCode::Char('j') => match self.current_tab {
                Tab::Scanner => {
                    if self.selected_result + 1 < self.scan_results.len() {
                        self.selected_result += 1;
                    }
                }
                Tab::Monitor => {
                    if self.selected_watch + 1 < self.monitor_rows.len() {
                        self.selected_watch += 1;
                    }
                }
                Tab::Logs => {}
            },

            // Promote the selected scan hit
            KeyCode::Enter => {
                if self.current_tab == Tab::Scanner && !self.scan_results.is_empty() {
                    self.promote_selected();
                }
            }

            // Remove from watchlist - show confirmation modal
            KeyCode::Delete | KeyCode::Backspace => {
                if self.current_tab == Tab::Monitor && !self.monitor_rows.is_empty() {
                    self.input_mode = InputMode::RemoveConfirmation;
                    self.remove_selection = Confirm::No;
                }
            }

            // Quit - show confirmation modal
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.input_mode = InputMode::QuitConfirmation;
                self.quit_selection = Confirm::No;
            }

            // Tab navigation
            KeyCode::Tab | KeyCode::Right => {
                self.current_tab = self.current_tab.next();
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.current_tab = self.current_tab.prev();
            }

            // Numeric tab selection
            KeyCode::Char('1') => self.current_tab = Tab::Scanner,
            KeyCode::Char('2') => self.current_tab = Tab::Monitor,
            KeyCode::Char('3') => self.current_tab = Tab::Logs,

            // Help
            KeyCode::Char('h') | KeyCode::Char('H') => {
                self.add_log(LogLevel::Info, "─── Keyboard Shortcuts ───");
                self.add_log(LogLevel::Info, "S        : Run a scan");
                self.add_log(LogLevel::Info, "U        : Cycle symbol source");
                self.add_log(LogLevel::Info, "R        : Refresh the monitor now");
                self.add_log(LogLevel::Info, ":        : Enter command mode");
                self.add_log(LogLevel::Info, "Tab/←/→  : Navigate tabs");
                self.add_log(LogLevel::Info, "↑/↓      : Navigate rows");
                self.add_log(LogLevel::Info, "Enter    : Watch the selected hit");
                self.add_log(LogLevel::Info, "Del      : Stop watching (Monitor tab)");
                self.add_log(LogLevel::Info, "Q        : Quit");
            }

            // Ctrl+C
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }

            _ => {}
        }

        Ok(())
    }

    fn handle_quit_confirmation(&mut self, event: KeyEvent) -> Result<()> {
        match event.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                self.quit_selection = self.quit_selection.toggle();
            }
            KeyCode::Enter => {
                if self.quit_selection == Confirm::Yes {
                    self.should_quit = true;
                }
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_remove_confirmation(&mut self, event: KeyEvent) -> Result<()> {
        match event.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                self.remove_selection = self.remove_selection.toggle();
            }
            KeyCode::Enter => {
                if self.remove_selection == Confirm::Yes {
                    self.remove_selected_watch();
                }
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
            }
            _ => {}
        }
        Ok(())
    }
}
