//! Report module - descriptive report runs, history and terminal display

pub mod history;
pub mod markdown;
pub mod summary;
pub mod writer;

pub use history::*;
pub use markdown::*;
pub use summary::*;
pub use writer::*;
