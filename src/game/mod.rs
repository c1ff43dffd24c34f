pub mod layout;
pub mod object;
pub mod session;

pub use layout::{Bounds, Point};
pub use object::{build_objects, ClickableObject};
pub use session::{Flow, Input, Screen, Session};
