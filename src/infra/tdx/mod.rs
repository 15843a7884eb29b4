//! Client for the TDX open transport data API.

mod client;
pub mod endpoints;

pub use client::TdxClient;
