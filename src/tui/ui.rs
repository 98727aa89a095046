use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Tabs},
};

use crate::tui::app::{App, Confirm, InputMode, LogLevel, Tab};
use crate::types::{round_display, Trend};

/// Draw the complete TUI.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let constraints = if app.input_mode == InputMode::Command {
        vec![
            Constraint::Length(3), // Header
            Constraint::Length(3), // Tabs
            Constraint::Min(8),    // Content
            Constraint::Length(3), // Command input
            Constraint::Length(3), // Footer
        ]
    } else {
        vec![
            Constraint::Length(3), // Header
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Content
            Constraint::Length(3), // Footer
        ]
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    draw_header(frame, layout[0], app);
    draw_tabs(frame, layout[1], app);
    draw_content(frame, layout[2], app);

    if app.input_mode == InputMode::Command {
        draw_command_input(frame, layout[3], app);
        draw_footer(frame, layout[4], app);
    } else {
        draw_footer(frame, layout[3], app);
    }

    match app.input_mode {
        InputMode::QuitConfirmation => draw_confirmation(
            frame,
            area,
            "Quit",
            "Leave the monitor?",
            app.quit_selection,
        ),
        InputMode::RemoveConfirmation => {
            let symbol = app
                .monitor_rows
                .get(app.selected_watch)
                .map(|row| row.symbol.as_str())
                .unwrap_or("?");
            draw_confirmation(
                frame,
                area,
                "Remove",
                &format!("Stop watching {}?", symbol),
                app.remove_selection,
            );
        }
        _ => {}
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let refresh = match app.next_refresh_in() {
        Some(0) => Span::styled(" [refreshing] ", Style::default().fg(Color::Yellow)),
        Some(secs) => Span::styled(
            format!(" [next check {}s] ", secs),
            Style::default().fg(Color::Yellow),
        ),
        None => Span::raw(""),
    };

    let watching = if app.watchlist.is_empty() {
        Span::raw("")
    } else {
        Span::styled(
            format!(" [{} watched] ", app.watchlist.len()),
            Style::default().fg(Color::Magenta),
        )
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "RVOL Breakout Scanner & Live Monitor",
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::raw(" "),
        watching,
        refresh,
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Status "),
    );

    frame.render_widget(header, area);
}

fn draw_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<Line> = Tab::all()
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let style = if *t == app.current_tab {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(format!(" [{}] {} ", i + 1, t.title())).style(style)
        })
        .collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(" Navigation "))
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .select(app.current_tab as usize);

    frame.render_widget(tabs, area);
}

fn draw_content(frame: &mut Frame, area: Rect, app: &App) {
    match app.current_tab {
        Tab::Scanner => draw_scanner(frame, area, app),
        Tab::Monitor => draw_monitor(frame, area, app),
        Tab::Logs => draw_logs(frame, area, app),
    }
}

fn draw_command_input(frame: &mut Frame, area: Rect, app: &App) {
    let input = Paragraph::new(Line::from(vec![
        Span::styled("Command: ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(&app.command_input, Style::default().fg(Color::White)),
        Span::styled("▌", Style::default().fg(Color::Yellow)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Command Mode (ESC to cancel) "),
    );

    frame.render_widget(input, area);
}

fn draw_scanner(frame: &mut Frame, area: Rect, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    // Filter summary
    let last_scan = match app.last_scan_at {
        Some(at) => format!("last scan {} UTC", at.format("%H:%M:%S")),
        None => "no scan yet - press S".to_string(),
    };
    let summary = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("  {}", app.universe.label()),
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::raw(format!(
            "  |  lookback {} bars  |  ${:.2}..${:.2}  |  RVOL ≥ {:.1}  |  ",
            app.config.lookback, app.config.min_price, app.config.max_price, app.config.min_rvol
        )),
        Span::styled(last_scan, Style::default().fg(Color::Gray)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Filters ")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(summary, layout[0]);

    if app.scan_results.is_empty() {
        let empty = Paragraph::new(vec![
            Line::raw(""),
            Line::styled(
                "  No hits. Run a scan with S, or adjust the filters.",
                Style::default().fg(Color::Yellow),
            ),
            Line::raw(""),
            Line::styled("  Commands:", Style::default().fg(Color::Gray)),
            Line::styled(
                "    /symbols AAPL,TSLA,...  - Set the custom list",
                Style::default().fg(Color::Gray),
            ),
            Line::styled(
                "    /source nasdaq100       - Pick a roster universe",
                Style::default().fg(Color::Gray),
            ),
            Line::styled(
                "    /price 2 20, /rvol 2.0  - Tune the filters",
                Style::default().fg(Color::Gray),
            ),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Scan Results ")
                .border_style(Style::default().fg(Color::Yellow)),
        );
        frame.render_widget(empty, layout[1]);
        return;
    }

    let header = Row::new(
        ["", "Symbol", "Price", "%Chg", "RVOL", "Volume", "AvgVol", ""]
            .into_iter()
            .map(|h| Cell::from(h).style(Style::default().fg(Color::Gray).bold())),
    )
    .height(1);

    let rows = app.scan_results.iter().enumerate().map(|(i, hit)| {
        let selected = i == app.selected_result;
        let watched = app.watchlist.contains(&hit.symbol);

        let marker = if selected { "▶" } else { " " };
        let symbol_style = if watched {
            Style::default().fg(Color::Green)
        } else if selected {
            Style::default().fg(Color::White).bold()
        } else {
            Style::default().fg(Color::Cyan)
        };
        let pct = round_display(hit.pct_change, 3);
        let pct_style = if pct > 0.0 {
            Style::default().fg(Color::Green)
        } else if pct < 0.0 {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Gray)
        };

        Row::new(vec![
            Cell::from(marker).style(Style::default().fg(Color::Yellow).bold()),
            Cell::from(hit.symbol.clone()).style(symbol_style),
            Cell::from(format!("${:.4}", round_display(hit.price, 4))),
            Cell::from(format!("{:+.3}%", pct)).style(pct_style),
            Cell::from(format!("{:.2}x", round_display(hit.rvol, 2))),
            Cell::from(format!("{}", hit.current_volume as u64)),
            Cell::from(format!("{}", hit.avg_volume as u64)),
            Cell::from(if watched { "✓" } else { "" }).style(Style::default().fg(Color::Green)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(8),
            Constraint::Length(11),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(2),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(
                " Scan Results ({} hits, {} skipped) ",
                app.scan_results.len(),
                app.scan_skipped
            ))
            .border_style(Style::default().fg(Color::Yellow)),
    );

    frame.render_widget(table, layout[1]);
}

fn draw_monitor(frame: &mut Frame, area: Rect, app: &App) {
    if app.watchlist.is_empty() {
        let empty = Paragraph::new(vec![
            Line::raw(""),
            Line::styled(
                "  Watchlist is empty.",
                Style::default().fg(Color::Yellow),
            ),
            Line::raw(""),
            Line::styled(
                "  Scan on the Scanner tab and promote hits with Enter,",
                Style::default().fg(Color::Gray),
            ),
            Line::styled(
                "  or add symbols directly with /add or /watchlist.",
                Style::default().fg(Color::Gray),
            ),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Live Watchlist ")
                .border_style(Style::default().fg(Color::Magenta)),
        );
        frame.render_widget(empty, area);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(4)])
        .split(area);

    let header = Row::new(
        [
            "", "Symbol", "Price", "Δ Price %", "Δ RVOL", "RVOL", "Volume", "AvgVol", "Trend",
            "Checked",
        ]
        .into_iter()
        .map(|h| Cell::from(h).style(Style::default().fg(Color::Gray).bold())),
    )
    .height(1);

    let rows = app.monitor_rows.iter().enumerate().map(|(i, row)| {
        let selected = i == app.selected_watch;
        let marker = if selected { "▶" } else { " " };

        let delta_price = round_display(row.delta_price_pct, 3);
        let delta_price_style = if delta_price > 0.0 {
            Style::default().fg(Color::Black).bg(Color::Green)
        } else if delta_price < 0.0 {
            Style::default().fg(Color::White).bg(Color::Red)
        } else {
            Style::default().fg(Color::Gray)
        };

        let delta_rvol = round_display(row.delta_rvol, 3);
        let delta_rvol_style = if delta_rvol > 0.0 {
            Style::default().fg(Color::Green)
        } else if delta_rvol < 0.0 {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Gray)
        };

        let trend_style = match row.trend {
            Trend::Up => Style::default().fg(Color::Green).bold(),
            Trend::Down => Style::default().fg(Color::Red).bold(),
            Trend::Neutral => Style::default().fg(Color::Gray),
        };

        Row::new(vec![
            Cell::from(marker).style(Style::default().fg(Color::Yellow).bold()),
            Cell::from(row.symbol.clone()).style(Style::default().fg(Color::Cyan).bold()),
            Cell::from(format!("${:.4}", round_display(row.price, 4))),
            Cell::from(format!("{:+.3}%", delta_price)).style(delta_price_style),
            Cell::from(format!("{:+.3}", delta_rvol)).style(delta_rvol_style),
            Cell::from(format!("{:.3}", round_display(row.rvol, 3))),
            Cell::from(format!("{}", row.current_volume as u64)),
            Cell::from(format!("{}", row.avg_volume as u64)),
            Cell::from(row.trend.arrow()).style(trend_style),
            Cell::from(row.last_checked.format("%H:%M:%S").to_string())
                .style(Style::default().fg(Color::Gray)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(8),
            Constraint::Length(11),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(11),
            Constraint::Length(11),
            Constraint::Length(5),
            Constraint::Length(9),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Live Watchlist ({}) ", app.watchlist.len()))
            .border_style(Style::default().fg(Color::Magenta)),
    );
    frame.render_widget(table, layout[0]);

    // symbols with no data this cycle keep their previous snapshot
    let skipped_lines: Vec<Line> = if app.monitor_skipped.is_empty() {
        vec![Line::styled(
            "  All watched symbols reported data this cycle.",
            Style::default().fg(Color::Gray),
        )]
    } else {
        app.monitor_skipped
            .iter()
            .take(2)
            .map(|skip| {
                Line::from(vec![
                    Span::styled(
                        format!("  {} ", skip.symbol),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(
                        format!("- {}, retrying next cycle", skip.reason),
                        Style::default().fg(Color::Gray),
                    ),
                ])
            })
            .collect()
    };
    let skipped = Paragraph::new(skipped_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" No Data ({}) ", app.monitor_skipped.len()))
            .border_style(Style::default().fg(Color::Gray)),
    );
    frame.render_widget(skipped, layout[1]);
}

fn draw_logs(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .logs
        .iter()
        .rev() // Show newest first
        .take(50)
        .map(|log| {
            let (prefix, style) = match log.level {
                LogLevel::Info => ("· ", Style::default().fg(Color::Cyan)),
                LogLevel::Warning => ("! ", Style::default().fg(Color::Yellow)),
                LogLevel::Error => ("✗ ", Style::default().fg(Color::Red)),
                LogLevel::Success => ("✓ ", Style::default().fg(Color::Green)),
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("[{}] ", log.timestamp),
                    Style::default().fg(Color::Gray),
                ),
                Span::raw(prefix),
                Span::styled(&log.message, style),
            ]))
        })
        .collect();

    let logs_list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Logs ({}) ", app.logs.len()))
            .border_style(Style::default().fg(Color::Gray)),
    );

    frame.render_widget(logs_list, area);
}

fn draw_confirmation(frame: &mut Frame, area: Rect, title: &str, question: &str, choice: Confirm) {
    let width = (question.len() as u16 + 8).max(30).min(area.width);
    let height = 5;
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    let no_style = if choice == Confirm::No {
        Style::default().fg(Color::Black).bg(Color::Gray).bold()
    } else {
        Style::default().fg(Color::Gray)
    };
    let yes_style = if choice == Confirm::Yes {
        Style::default().fg(Color::White).bg(Color::Red).bold()
    } else {
        Style::default().fg(Color::Gray)
    };

    let body = Paragraph::new(vec![
        Line::styled(question.to_string(), Style::default().fg(Color::White)),
        Line::raw(""),
        Line::from(vec![
            Span::styled("  [ No ]  ", no_style),
            Span::styled("  [ Yes ]  ", yes_style),
        ]),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", title))
            .border_style(Style::default().fg(Color::Red)),
    );

    frame.render_widget(Clear, popup);
    frame.render_widget(body, popup);
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App) {
    let shortcuts = match app.current_tab {
        Tab::Scanner => Line::from(vec![
            Span::styled(" [S]", Style::default().fg(Color::Yellow).bold()),
            Span::raw("can  "),
            Span::styled("[U]", Style::default().fg(Color::Cyan).bold()),
            Span::raw("niverse  "),
            Span::styled("[↑↓]", Style::default().fg(Color::Blue).bold()),
            Span::raw("Nav  "),
            Span::styled("[Enter]", Style::default().fg(Color::Green).bold()),
            Span::raw("Watch  "),
            Span::styled("[:]", Style::default().fg(Color::Magenta).bold()),
            Span::raw("Cmd  "),
            Span::styled("[Q]", Style::default().fg(Color::Red).bold()),
            Span::raw("uit"),
        ]),
        Tab::Monitor => Line::from(vec![
            Span::styled(" [R]", Style::default().fg(Color::Green).bold()),
            Span::raw("efresh  "),
            Span::styled("[↑↓]", Style::default().fg(Color::Blue).bold()),
            Span::raw("Nav  "),
            Span::styled("[Del]", Style::default().fg(Color::Red).bold()),
            Span::raw("Remove  "),
            Span::styled("[:]", Style::default().fg(Color::Magenta).bold()),
            Span::raw("Cmd  "),
            Span::styled("[Q]", Style::default().fg(Color::Red).bold()),
            Span::raw("uit"),
        ]),
        Tab::Logs => Line::from(vec![
            Span::styled(" [H]", Style::default().fg(Color::Blue).bold()),
            Span::raw("elp  "),
            Span::styled("[:]", Style::default().fg(Color::Magenta).bold()),
            Span::raw("Cmd  "),
            Span::styled("[Q]", Style::default().fg(Color::Red).bold()),
            Span::raw("uit"),
        ]),
    };

    let footer = Paragraph::new(shortcuts)
        .block(Block::default().borders(Borders::ALL).title(" Shortcuts "))
        .alignment(Alignment::Center);

    frame.render_widget(footer, area);
}
