//! Logical screen geometry. Everything the player can click is expressed in
//! these coordinates; the terminal viewport maps them onto cells.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Bounds {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Bounds { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Half-open on the right and bottom edges.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }
}

pub const TOP_BAR_HEIGHT: i32 = 48;

pub const QUESTION_PANEL: Bounds = Bounds::new(110, 70, 580, 460);
pub const LOCK_PANEL: Bounds = Bounds::new(180, 190, 440, 220);

const BUTTON_HEIGHT: i32 = 44;
const BUTTON_GAP: i32 = 12;
pub const ANSWER_BUTTONS: usize = 4;

/// Answer button `index` (0..4) inside the question panel.
pub fn answer_button(index: usize) -> Bounds {
    let panel = QUESTION_PANEL;
    let first_y = panel.bottom() - (BUTTON_HEIGHT + BUTTON_GAP) * ANSWER_BUTTONS as i32 - 18;
    Bounds::new(
        panel.x + 20,
        first_y + index as i32 * (BUTTON_HEIGHT + BUTTON_GAP),
        panel.w - 40,
        BUTTON_HEIGHT,
    )
}

pub fn toast_box(width: i32, height: i32) -> Bounds {
    Bounds::new(14, height - 52, width - 28, 40)
}
