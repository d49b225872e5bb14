//! Pipeline module - load, type and aggregate registry tables

pub mod cell;
pub mod groups;
pub mod loader;
pub mod summary;
pub mod typed;

pub use cell::*;
pub use groups::*;
pub use loader::*;
pub use summary::*;
pub use typed::*;
