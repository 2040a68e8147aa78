//! Generative model backend

pub mod client;

pub use client::LlmClient;
