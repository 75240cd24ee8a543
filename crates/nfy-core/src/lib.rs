//! Core domain + application logic for the "not for you" bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and SQLite live
//! behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod parse;
pub mod ports;
pub mod registry;
pub mod service;
pub mod utils;

pub use errors::{Error, Result};
