//! Moltbook platform integration
//!
//! HTTP client for the Moltbook API plus the engagement provider used
//! by the persona update loop.

pub mod client;
pub mod engagement;

pub use client::{MoltbookClient, DEFAULT_BASE_URL};
pub use engagement::{snapshot_from_profile, MoltbookEngagement};
