//! Request handlers.

pub mod edits;
pub mod health;
pub mod videos;

pub use edits::*;
pub use health::*;
pub use videos::*;
