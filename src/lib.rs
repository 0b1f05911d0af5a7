//! ironlog - Strength training log with progressive overload
//!
//! Pure analytics over logged sets plus a small SQLite store that feeds them.

pub mod analytics;
pub mod db;
pub mod error;
pub mod muscles;

pub use db::Database;
pub use error::ParseError;
