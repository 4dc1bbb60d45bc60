//! Core types for kb-chat
//!
//! This crate provides the configuration, logging, session history and
//! knowledge base used by the other kb-chat components.

pub mod config;
pub mod error;
pub mod knowledge;
pub mod logging;
pub mod session;
pub mod utils;

pub use error::{Error, Result};
