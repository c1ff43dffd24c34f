pub mod loader;
pub mod types;

pub use loader::{door_code, load_catalog};
pub use types::Question;
