mod draw;
pub mod terminal;
pub mod viewport;

pub use draw::draw_ui;
pub use terminal::TerminalGuard;
pub use viewport::Viewport;
