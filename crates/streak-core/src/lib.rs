//! Core types and logic for the 3-day streak habit tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The engine, lifecycle, statistics and badge modules are pure functions
//! over habit snapshots; [`tracker::HabitTracker`] connects them to a
//! [`store::HabitStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod badge;
pub mod context;
pub mod engine;
pub mod error;
pub mod habit;
pub mod lifecycle;
pub mod notify;
pub mod stats;
pub mod store;
pub mod tracker;

pub use error::{Error, Result};
