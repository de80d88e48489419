use crossterm::cursor::{Hide, Show};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use std::collections::HashMap;
use std::io::{self, Stdout};

pub const CELL_WIDTH: u16 = 2;

const FALLBACK_TILE: Tile = Tile {
    glyph: '?',
    color: Rgb {
        r: 128,
        g: 128,
        b: 128,
    },
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb
{
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Clone, Copy)]
pub struct Tile
{
    pub glyph: char,
    pub color: Rgb,
}

/// Grid of cells addressed by (row, column), each showing one symbolic asset.
/// Writes outside the grid are ignored.
pub trait Surface
{
    fn set_cell(&mut self, row: usize, col: usize, asset: &'static str);
}

pub struct TerminalSurface
{
    rows: usize,
    cols: usize,
    origin_row: u16,
    origin_col: u16,
    cells: Vec<&'static str>,
    tiles: HashMap<&'static str, Tile>,
}

impl TerminalSurface
{
    pub fn new(
        rows: usize,
        cols: usize,
        fill: &'static str,
        origin_row: u16,
        origin_col: u16,
    ) -> Self
    {
        Self {
            rows,
            cols,
            origin_row,
            origin_col,
            cells: vec![fill; rows * cols],
            tiles: HashMap::new(),
        }
    }

    pub fn register(&mut self, asset: &'static str, glyph: char, color: Rgb)
    {
        self.tiles.insert(asset, Tile { glyph, color });
    }

    pub fn geometry(&self) -> GridGeometry
    {
        GridGeometry {
            origin_row: self.origin_row,
            origin_col: self.origin_col,
            rows: self.rows,
            cols: self.cols,
        }
    }

    pub fn asset_at(&self, row: usize, col: usize) -> Option<&'static str>
    {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.cells[row * self.cols + col])
    }

    pub fn render_lines(&self, highlight: Option<(usize, usize)>) -> Vec<String>
    {
        let mut lines = Vec::with_capacity(self.rows);
        for row in 0..self.rows {
            let mut line = String::with_capacity(self.cols * CELL_WIDTH as usize + 16);
            let mut active: Option<Rgb> = None;
            for col in 0..self.cols {
                let asset = self.cells[row * self.cols + col];
                let tile = self.tiles.get(asset).copied().unwrap_or(FALLBACK_TILE);
                if active != Some(tile.color) {
                    line.push_str(&ansi_color(tile.color));
                    active = Some(tile.color);
                }
                let selected = highlight == Some((row, col));
                if selected {
                    line.push_str("\x1b[7m");
                }
                line.push(tile.glyph);
                line.push(' ');
                if selected {
                    line.push_str("\x1b[27m");
                }
            }
            line.push_str("\x1b[0m");
            lines.push(line);
        }
        lines
    }
}

impl Surface for TerminalSurface
{
    fn set_cell(&mut self, row: usize, col: usize, asset: &'static str)
    {
        if row >= self.rows || col >= self.cols {
            return;
        }
        self.cells[row * self.cols + col] = asset;
    }
}

/// Where the grid sits on screen, for mapping mouse positions back to cells.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GridGeometry
{
    pub origin_row: u16,
    pub origin_col: u16,
    pub rows: usize,
    pub cols: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Third
{
    Left,
    Middle,
    Right,
}

impl GridGeometry
{
    pub fn cell_at(&self, screen_col: u16, screen_row: u16) -> Option<(usize, usize)>
    {
        if screen_row < self.origin_row || screen_col < self.origin_col {
            return None;
        }
        let row = (screen_row - self.origin_row) as usize;
        let col = ((screen_col - self.origin_col) / CELL_WIDTH) as usize;
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some((row, col))
    }

    pub fn third_at(&self, screen_col: u16) -> Option<Third>
    {
        let width = self.cols as u16 * CELL_WIDTH;
        if screen_col < self.origin_col || screen_col >= self.origin_col + width {
            return None;
        }
        let offset = screen_col - self.origin_col;
        if offset < width / 3 {
            Some(Third::Left)
        } else if offset < width * 2 / 3 {
            Some(Third::Middle)
        } else {
            Some(Third::Right)
        }
    }
}

fn ansi_color(color: Rgb) -> String
{
    format!("\x1b[38;2;{};{};{}m", color.r, color.g, color.b)
}

pub struct TerminalGuard
{
    stdout: Stdout,
}

impl TerminalGuard
{
    pub fn enter() -> io::Result<Self>
    {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture, Hide)?;
        Ok(Self { stdout })
    }

    pub fn stdout(&mut self) -> &mut Stdout
    {
        &mut self.stdout
    }
}

impl Drop for TerminalGuard
{
    fn drop(&mut self)
    {
        let _ = execute!(self.stdout, Show, DisableMouseCapture, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
pub struct RecordingSurface
{
    rows: usize,
    cols: usize,
    cells: Vec<&'static str>,
    writes: Vec<(usize, usize, &'static str)>,
}

#[cfg(test)]
impl RecordingSurface
{
    pub fn new(rows: usize, cols: usize) -> Self
    {
        Self {
            rows,
            cols,
            cells: vec![""; rows * cols],
            writes: Vec::new(),
        }
    }

    pub fn asset_at(&self, row: usize, col: usize) -> Option<&'static str>
    {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.cells[row * self.cols + col])
    }

    pub fn take_writes(&mut self) -> Vec<(usize, usize, &'static str)>
    {
        std::mem::take(&mut self.writes)
    }
}

#[cfg(test)]
impl Surface for RecordingSurface
{
    fn set_cell(&mut self, row: usize, col: usize, asset: &'static str)
    {
        if row >= self.rows || col >= self.cols {
            return;
        }
        self.cells[row * self.cols + col] = asset;
        self.writes.push((row, col, asset));
    }
}
