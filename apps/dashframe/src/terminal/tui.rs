use std::io::{self, Stdout};
use std::panic;
use std::time::Duration;

use bytes::Bytes;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use frame_bus::TransportResult;
use ratatui::backend::CrosstermBackend;
use tracing::{debug, error};

use crate::engine::{Control, Engine, EngineError, SessionEnd};
use crate::render::{RenderBackend, TerminalRenderer};
use crate::terminal::error::CliError;

pub type Tui = TerminalRenderer<CrosstermBackend<Stdout>>;

/// Frames applied per wakeup before the screen is redrawn.
const MAX_FRAMES_PER_DRAW: usize = 256;

pub fn setup_tui() -> Result<Tui, CliError> {
    enable_raw_mode().map_err(|err| CliError::Runtime(err.to_string()))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(|err| CliError::Runtime(err.to_string()))?;
    let mut tui = TerminalRenderer::new(CrosstermBackend::new(stdout))
        .map_err(|err| CliError::Runtime(err.to_string()))?;
    tui.terminal_mut().hide_cursor().ok();
    Ok(tui)
}

pub fn teardown_tui() -> io::Result<()> {
    disable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen, crossterm::cursor::Show)?;
    Ok(())
}

/// Logs panics and hands the terminal back before the default hook prints.
pub fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        error!(target: "dashframe::panic", panic = %info, "dashboard panicked");
        let _ = teardown_tui();
        previous(info);
    }));
}

/// Drives the engine from `frames` while watching the keyboard. The
/// dashboard stays up after the source closes until the viewer quits.
pub fn run_loop<R: RenderBackend + ?Sized>(
    engine: &mut Engine,
    frames: &Receiver<TransportResult<Bytes>>,
    tick: Duration,
    renderer: &mut R,
) -> Result<SessionEnd, CliError> {
    renderer.draw(engine.state()).map_err(EngineError::from)?;
    loop {
        let mut dirty = false;

        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let ctrl_c = key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL);
                    if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) || ctrl_c {
                        debug!(target: "dashframe::tui", "quit requested");
                        return Ok(SessionEnd::Quit);
                    }
                }
                Event::Resize(cols, rows) => {
                    debug!(target: "dashframe::tui", cols, rows, "terminal resized");
                    dirty = true;
                }
                _ => {}
            }
        }

        if !engine.state().stats.source_closed {
            match frames.recv_timeout(tick) {
                Ok(first) => {
                    let batch = std::iter::once(first)
                        .chain(frames.try_iter())
                        .take(MAX_FRAMES_PER_DRAW);
                    for frame in batch {
                        let bytes = frame.map_err(EngineError::from)?;
                        dirty = true;
                        if engine.process(&bytes) == Control::Exit {
                            renderer.draw(engine.state()).map_err(EngineError::from)?;
                            return Ok(SessionEnd::Exit);
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    engine.close_source();
                    dirty = true;
                }
            }
        } else if !event::poll(tick)? {
            continue;
        }

        if dirty {
            renderer.draw(engine.state()).map_err(EngineError::from)?;
        }
    }
}
