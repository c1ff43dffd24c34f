use ratatui::layout::Rect;

use crate::game::{Bounds, Point};

/// Maps the game's logical pixel screen onto the terminal cells it is drawn
/// in. Each cell covers two logical half-rows so pictures can be drawn with
/// half-block characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    area: Rect,
    logical_w: i32,
    logical_h: i32,
}

impl Viewport {
    pub fn new(area: Rect, logical_w: i32, logical_h: i32) -> Self {
        Viewport {
            area,
            logical_w: logical_w.max(1),
            logical_h: logical_h.max(1),
        }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn logical_size(&self) -> (i32, i32) {
        (self.logical_w, self.logical_h)
    }

    /// Logical width and height of a single cell, rounded up.
    pub fn cell_size(&self) -> (i32, i32) {
        let w = self.area.width.max(1) as i32;
        let h = self.area.height.max(1) as i32;
        (
            (self.logical_w + w - 1) / w,
            (self.logical_h + h - 1) / h,
        )
    }

    /// The logical point at the centre of a terminal cell, `None` when the
    /// cell is outside the game area.
    pub fn to_logical(&self, column: u16, row: u16) -> Option<Point> {
        if !self.area.contains((column, row).into()) {
            return None;
        }
        let col = (column - self.area.x) as i64;
        let row = (row - self.area.y) as i64;
        Some(Point::new(
            scale(col * 2 + 1, self.logical_w, self.area.width as i64 * 2),
            scale(row * 2 + 1, self.logical_h, self.area.height as i64 * 2),
        ))
    }

    /// Logical y of the upper and lower half of a cell row.
    pub fn half_rows(&self, row: u16) -> (i32, i32) {
        let row = row.saturating_sub(self.area.y) as i64;
        let quarters = self.area.height as i64 * 4;
        (
            scale(row * 4 + 1, self.logical_h, quarters),
            scale(row * 4 + 3, self.logical_h, quarters),
        )
    }

    /// Cells covering a logical rectangle, clipped to the viewport. Edges are
    /// rounded so every returned cell's centre lies inside `bounds`.
    pub fn to_cells(&self, bounds: Bounds) -> Rect {
        let w = self.area.width as i64;
        let h = self.area.height as i64;
        let x0 = round_to_cell(bounds.x, w, self.logical_w);
        let x1 = round_to_cell(bounds.right(), w, self.logical_w);
        let y0 = round_to_cell(bounds.y, h, self.logical_h);
        let y1 = round_to_cell(bounds.bottom(), h, self.logical_h);
        Rect::new(
            self.area.x + x0,
            self.area.y + y0,
            x1.saturating_sub(x0),
            y1.saturating_sub(y0),
        )
    }
}

fn scale(value: i64, logical: i32, cells: i64) -> i32 {
    (value * logical as i64 / cells.max(1)) as i32
}

fn round_to_cell(logical: i32, cells: i64, logical_size: i32) -> u16 {
    let logical = (logical.max(0) as i64).min(logical_size as i64);
    let size = logical_size as i64;
    ((2 * logical * cells + size) / (2 * size)).min(cells) as u16
}
