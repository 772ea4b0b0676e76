//! services/bot/src/lib.rs
//!
//! Adapters, configuration and the HTTP surface of the site report bot.
//! The binaries in `src/bin` wire these together.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
