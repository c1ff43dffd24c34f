pub mod store;

pub use store::{Progress, ProgressStore};
