use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use std::time::Duration;

/// What the event loop woke up for: a key press, or nothing within the
/// poll window. Ticks drive the periodic monitor refresh.
#[derive(Debug)]
pub enum InputEvent {
    Key(KeyEvent),
    Tick,
}

/// Polls keyboard input with a fixed tick rate.
pub struct EventPoller {
    tick_rate: Duration,
}

impl EventPoller {
    pub fn new(tick_rate_ms: u64) -> Self {
        Self {
            tick_rate: Duration::from_millis(tick_rate_ms),
        }
    }

    /// Waits up to one tick for a key press. Release and repeat events
    /// are swallowed so a held key does not spam the app.
    pub fn next(&self) -> std::io::Result<InputEvent> {
        if event::poll(self.tick_rate)? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    return Ok(InputEvent::Key(key_event));
                }
            }
        }
        Ok(InputEvent::Tick)
    }
}
