//! PNG snapshots of the dashboard.
//!
//! The dashboard is drawn into an off-screen ratatui buffer and every cell
//! becomes an 8x16 pixel tile in its background colour. No font is bundled:
//! braille, block and box-drawing symbols are drawn as shapes, any other
//! glyph as a solid foreground mark. Enough to see layout, colours and charts.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::{ImageFormat, Rgb, RgbImage};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;
use thiserror::Error;

use crate::engine::DashboardState;
use crate::render::DashboardView;

const CELL_WIDTH: u32 = 8;
const CELL_HEIGHT: u32 = 16;

const DEFAULT_FG: [u8; 3] = [192, 192, 192];
const DEFAULT_BG: [u8; 3] = [0, 0, 0];

#[derive(Debug, Error)]
pub enum ScreenshotError {
    #[error("screenshot size must be at least 1x1 cells")]
    EmptySize,
    #[error("failed to write screenshot {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Terminal size in cells, written `COLSxROWS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub cols: u16,
    pub rows: u16,
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self { cols: 120, rows: 40 }
    }
}

impl fmt::Display for ScreenSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

impl FromStr for ScreenSize {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (cols, rows) = raw
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected COLSxROWS, got {raw:?}"))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<u16>()
                .ok()
                .filter(|cells| *cells > 0)
                .ok_or_else(|| format!("invalid cell count {part:?} in {raw:?}"))
        };
        Ok(Self {
            cols: parse(cols)?,
            rows: parse(rows)?,
        })
    }
}

/// Draws the dashboard off-screen at `size`.
pub fn render_buffer(state: &DashboardState, size: ScreenSize) -> Buffer {
    let area = Rect::new(0, 0, size.cols, size.rows);
    let mut buffer = Buffer::empty(area);
    DashboardView::new(state).render(area, &mut buffer);
    buffer
}

pub fn rasterize(buffer: &Buffer) -> RgbImage {
    let cols = u32::from(buffer.area.width);
    let rows = u32::from(buffer.area.height);
    let mut image = RgbImage::new(cols * CELL_WIDTH, rows * CELL_HEIGHT);
    if cols == 0 {
        return image;
    }
    for (index, cell) in buffer.content.iter().enumerate() {
        let index = index as u32;
        let tile = Tile {
            x: (index % cols) * CELL_WIDTH,
            y: (index / cols) * CELL_HEIGHT,
        };
        let fg = rgb(cell.fg, DEFAULT_FG);
        tile.fill(&mut image, 0, 0, CELL_WIDTH, CELL_HEIGHT, rgb(cell.bg, DEFAULT_BG));
        if let Some(glyph) = cell.symbol().chars().next() {
            draw_glyph(&mut image, tile, glyph, fg);
        }
    }
    image
}

/// Renders the dashboard at `size` and writes it to `path` as PNG.
pub fn save(state: &DashboardState, size: ScreenSize, path: &Path) -> Result<(), ScreenshotError> {
    if size.cols == 0 || size.rows == 0 {
        return Err(ScreenshotError::EmptySize);
    }
    rasterize(&render_buffer(state, size))
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| ScreenshotError::Write {
            path: path.to_path_buf(),
            source,
        })
}

#[derive(Debug, Clone, Copy)]
struct Tile {
    x: u32,
    y: u32,
}

impl Tile {
    fn fill(self, image: &mut RgbImage, dx: u32, dy: u32, width: u32, height: u32, color: Rgb<u8>) {
        for y in dy..(dy + height).min(CELL_HEIGHT) {
            for x in dx..(dx + width).min(CELL_WIDTH) {
                image.put_pixel(self.x + x, self.y + y, color);
            }
        }
    }
}

fn draw_glyph(image: &mut RgbImage, tile: Tile, glyph: char, fg: Rgb<u8>) {
    const MID_X: u32 = CELL_WIDTH / 2;
    const MID_Y: u32 = CELL_HEIGHT / 2;
    match glyph {
        ' ' => {}
        '█' => tile.fill(image, 0, 0, CELL_WIDTH, CELL_HEIGHT, fg),
        '▀' => tile.fill(image, 0, 0, CELL_WIDTH, MID_Y, fg),
        '▄' => tile.fill(image, 0, MID_Y, CELL_WIDTH, MID_Y, fg),
        '▌' => tile.fill(image, 0, 0, MID_X, CELL_HEIGHT, fg),
        '▐' => tile.fill(image, MID_X, 0, MID_X, CELL_HEIGHT, fg),
        '\u{2800}'..='\u{28ff}' => {
            let bits = u32::from(glyph) - 0x2800;
            // Braille dot order: 1-3 down the left column, 4-6 down the right, then 7 and 8.
            const DOTS: [(u32, u32); 8] = [(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2), (0, 3), (1, 3)];
            for (bit, &(col, row)) in DOTS.iter().enumerate() {
                if bits & (1 << bit) != 0 {
                    tile.fill(image, 1 + col * MID_X, 1 + row * 4, 2, 2, fg);
                }
            }
        }
        _ => match box_arms(glyph) {
            Some((left, right, up, down)) => {
                if left {
                    tile.fill(image, 0, MID_Y, MID_X + 1, 1, fg);
                }
                if right {
                    tile.fill(image, MID_X, MID_Y, MID_X, 1, fg);
                }
                if up {
                    tile.fill(image, MID_X, 0, 1, MID_Y + 1, fg);
                }
                if down {
                    tile.fill(image, MID_X, MID_Y, 1, MID_Y, fg);
                }
            }
            None => tile.fill(image, 1, 4, CELL_WIDTH - 2, CELL_HEIGHT - 7, fg),
        },
    }
}

/// Which of left, right, up and down a box-drawing glyph reaches.
fn box_arms(glyph: char) -> Option<(bool, bool, bool, bool)> {
    let arms = match glyph {
        '─' | '━' | '═' => (true, true, false, false),
        '│' | '┃' | '║' => (false, false, true, true),
        '┌' | '╭' | '╔' => (false, true, false, true),
        '┐' | '╮' | '╗' => (true, false, false, true),
        '└' | '╰' | '╚' => (false, true, true, false),
        '┘' | '╯' | '╝' => (true, false, true, false),
        '├' => (false, true, true, true),
        '┤' => (true, false, true, true),
        '┬' => (true, true, false, true),
        '┴' => (true, true, true, false),
        '┼' => (true, true, true, true),
        _ => return None,
    };
    Some(arms)
}

fn rgb(color: Color, reset: [u8; 3]) -> Rgb<u8> {
    Rgb(match color {
        Color::Reset => reset,
        Color::Rgb(r, g, b) => [r, g, b],
        Color::Indexed(index) => indexed(index),
        Color::Black => indexed(0),
        Color::Red => indexed(1),
        Color::Green => indexed(2),
        Color::Yellow => indexed(3),
        Color::Blue => indexed(4),
        Color::Magenta => indexed(5),
        Color::Cyan => indexed(6),
        Color::Gray => indexed(7),
        Color::DarkGray => indexed(8),
        Color::LightRed => indexed(9),
        Color::LightGreen => indexed(10),
        Color::LightYellow => indexed(11),
        Color::LightBlue => indexed(12),
        Color::LightMagenta => indexed(13),
        Color::LightCyan => indexed(14),
        Color::White => indexed(15),
    })
}

/// xterm 256-colour palette.
fn indexed(index: u8) -> [u8; 3] {
    const ANSI: [[u8; 3]; 16] = [
        [0, 0, 0],
        [170, 0, 0],
        [0, 170, 0],
        [170, 85, 0],
        [0, 0, 170],
        [170, 0, 170],
        [0, 170, 170],
        [170, 170, 170],
        [85, 85, 85],
        [255, 85, 85],
        [85, 255, 85],
        [255, 255, 85],
        [85, 85, 255],
        [255, 85, 255],
        [85, 255, 255],
        [255, 255, 255],
    ];
    match index {
        0..=15 => ANSI[usize::from(index)],
        16..=231 => {
            let cube = index - 16;
            let level = |step: u8| if step == 0 { 0 } else { 55 + step * 40 };
            [level(cube / 36), level((cube / 6) % 6), level(cube % 6)]
        }
        _ => {
            let gray = 8 + (index - 232) * 10;
            [gray, gray, gray]
        }
    }
}
