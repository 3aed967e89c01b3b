//! Core types and pure logic for the trailmap activity feed.
//!
//! This crate is deliberately free of database and CLI dependencies. It owns
//! the location normalizer, the streak calculator and the feed builder, plus
//! the [`store::ActivityStore`] abstraction the pipeline runs against.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod activity;
pub mod error;
pub mod feed;
pub mod location;
pub mod pipeline;
pub mod store;
pub mod streak;
pub mod suffix;

pub use error::{Error, Result};
