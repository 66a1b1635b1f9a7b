//! Drawing the dashboard. The engine only talks to [`RenderBackend`]; the
//! ratatui implementation lives in [`TerminalRenderer`].

use std::io;

use ratatui::Terminal;
use ratatui::backend::Backend;

use crate::engine::DashboardState;

pub mod screenshot;
mod view;

pub use screenshot::{ScreenSize, ScreenshotError};
pub use view::DashboardView;

pub trait RenderBackend {
    fn draw(&mut self, state: &DashboardState) -> io::Result<()>;
}

/// Renderer for headless runs: counts draws, shows nothing.
#[derive(Debug, Default)]
pub struct NullRenderer {
    draws: usize,
}

impl NullRenderer {
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl RenderBackend for NullRenderer {
    fn draw(&mut self, _state: &DashboardState) -> io::Result<()> {
        self.draws += 1;
        Ok(())
    }
}

pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
}

impl<B: Backend> TerminalRenderer<B> {
    pub fn new(backend: B) -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::new(backend)?,
        })
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }
}

impl<B: Backend> RenderBackend for TerminalRenderer<B> {
    fn draw(&mut self, state: &DashboardState) -> io::Result<()> {
        self.terminal
            .draw(|frame| frame.render_widget(DashboardView::new(state), frame.area()))?;
        Ok(())
    }
}
