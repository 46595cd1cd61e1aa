//! services/api/src/lib.rs
//!
//! Library root for the API service: configuration, adapters, and the web
//! layer. The binaries under `src/bin` wire these together.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
