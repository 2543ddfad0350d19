use crate::grid::{Cell, Grid};
use anyhow::Result;
use bacteria_common::PopulationRecord;
use crossterm::{
    cursor, queue,
    style::Print,
    terminal::{self, ClearType},
};
use std::fmt::Write as _;
use std::io::Write;

/// Observer of each generation. Never feeds anything back into the simulation.
pub trait DisplaySink {
    fn render(&mut self, grid: &Grid, record: &PopulationRecord) -> Result<()>;
}

/// Drops every frame.
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn render(&mut self, _grid: &Grid, _record: &PopulationRecord) -> Result<()> {
        Ok(())
    }
}

/// Text picture of the lower-left `view x view` corner, origin at the bottom.
pub fn render_viewport(grid: &Grid, view: usize) -> String {
    let view = view.min(grid.size());
    let mut out = String::with_capacity((view * 2 + 8) * (view + 2));

    for y in (0..view).rev() {
        let _ = write!(out, "{:2}| ", y);
        for x in 0..view {
            out.push_str(match grid.get(x, y) {
                Cell::Empty => ". ",
                Cell::Full => "O ",
            });
        }
        out.push('\n');
    }

    out.push_str("   ");
    out.push_str(&"-".repeat(view * 2));
    out.push('\n');
    for x in (0..=view).step_by(2) {
        let _ = write!(out, "{:4}", x);
    }
    out.push('\n');
    out
}

/// Redraws the viewport in place on a terminal.
pub struct TerminalViewport<W: Write> {
    out: W,
    view_size: usize,
}

impl<W: Write> TerminalViewport<W> {
    pub fn new(out: W, view_size: usize) -> Self {
        Self { out, view_size }
    }
}

impl TerminalViewport<std::io::Stdout> {
    pub fn stdout(view_size: usize) -> Self {
        Self::new(std::io::stdout(), view_size)
    }
}

impl<W: Write> DisplaySink for TerminalViewport<W> {
    fn render(&mut self, grid: &Grid, record: &PopulationRecord) -> Result<()> {
        let frame = render_viewport(grid, self.view_size);
        queue!(self.out, terminal::Clear(ClearType::All), cursor::MoveTo(0, 0))?;
        for line in frame.lines() {
            queue!(self.out, Print(line), Print("\r\n"))?;
        }
        queue!(
            self.out,
            Print(format!(
                "Step: {} | Total Bacteria: {}\r\n",
                record.step, record.bacteria_count
            ))
        )?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_draws_origin_bottom_left() {
        let mut grid = Grid::with_size(10);
        grid.set(1, 0, Cell::Full);
        grid.set(0, 1, Cell::Full);

        let text = render_viewport(&grid, 4);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], " 3| . . . . ");
        assert_eq!(lines[2], " 1| O . . . ");
        assert_eq!(lines[3], " 0| . O . . ");
        assert_eq!(lines[4], "   --------");
        assert_eq!(lines[5], "   0   2   4");
    }

    #[test]
    fn viewport_is_clamped_to_grid() {
        let mut grid = Grid::with_size(2);
        grid.set(1, 1, Cell::Full);
        let text = render_viewport(&grid, 40);
        assert_eq!(text, " 1| . O \n 0| . . \n   ----\n   0   2\n");
    }

    #[test]
    fn terminal_frame_ends_with_status_line() {
        let mut grid = Grid::with_size(3);
        grid.set(0, 0, Cell::Full);
        let mut display = TerminalViewport::new(Vec::new(), 3);
        display.render(&grid, &PopulationRecord::new(4, 1)).unwrap();

        let text = String::from_utf8(display.out).unwrap();
        assert!(text.contains(" 0| O . . \r\n"));
        assert!(text.ends_with("Step: 4 | Total Bacteria: 1\r\n"));
    }
}
