//! Incident Client - Adapters for the incidents REST endpoint
//!
//! This crate implements the `IncidentApi` port over HTTP, plus an in-memory
//! adapter that behaves like the server for development and tests.

pub mod http;
pub mod memory;

pub use http::HttpIncidentApi;
pub use memory::MemoryIncidentApi;
