//! Suggest Proxy Library
//!
//! Proxies an upstream search-suggestion API, enriches suggestions with entity
//! metadata in the background and caches the results for later requests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod enrich;
pub mod error;
pub mod handler;
