//! Topic search backed by the dmhy RSS feed.

pub mod client;
pub mod feed;

pub use client::{DmhyClient, DmhySession};
