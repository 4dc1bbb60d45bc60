//! Session management for conversation history
//!
//! Sessions live in memory for the lifetime of the process and keep a bounded
//! number of turns each.

pub mod store;
pub mod turn;

pub use store::{SessionStore, DEFAULT_MAX_HISTORY};
pub use turn::{Role, Turn};
