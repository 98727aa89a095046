mod app;
mod events;
mod ui;

pub use app::App;
pub use events::{EventPoller, InputEvent};

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io::stdout;

/// Initialize the terminal and run the TUI until quit.
pub async fn run_tui(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let poller = EventPoller::new(100); // 100ms tick rate

    let result = run_app(&mut terminal, &mut app, &poller).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    poller: &EventPoller,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if let InputEvent::Key(event) = poller.next()? {
            app.handle_event(event).await?;
        }

        if app.should_quit {
            break;
        }

        // Periodic monitor refresh rides on the tick cadence
        app.refresh_data().await;
    }

    Ok(())
}
