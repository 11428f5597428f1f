//! Fetch gateway.
//!
//! Performs the HTTP GET behind every relayed request and absorbs all of its
//! failures.

pub mod error_page;
pub mod gateway;

pub use gateway::{Fetch, HttpFetcher};
