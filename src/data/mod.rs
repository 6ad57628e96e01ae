//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite connection pool and account/post queries
//! - Follow and like edge storage
//! - Denormalized engagement counters

pub mod counters;
mod database;
pub mod likes;
mod models;
pub mod relationships;

pub use counters::CounterOwner;
pub use database::Database;
pub use models::*;
