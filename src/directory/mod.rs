pub mod details;
pub mod search;

pub use details::details;
pub use search::{nearby, search};
