//! Vidacquire - video platform data acquisition and crawling system.
//!
//! Drives a continuation-based pagination protocol against a video
//! platform's internal JSON endpoints: video metadata, comment threads
//! with concurrent reply fan-out, live chat (live and replay), and
//! channel/playlist listings. A bounded-concurrency scheduler crawls
//! outward from seed resources, and a batch sink persists results while
//! watching for systemic failures.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod protocol;
pub mod scheduler;
pub mod sink;
pub mod walker;
