//! HTTP transport

mod client;

pub use client::{endpoint, ensure_success, HttpClient, HttpClientBuilder};
