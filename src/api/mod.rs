//! Types and HTTP client for the remote design API.

pub mod client;
pub mod models;

pub use client::{ApiClient, DesignApi};
