//! Incident Core - Domain models, form pipeline, and dropdown controller
//!
//! This crate contains the core logic of the incident reporting client: the
//! validation and submission pipeline, the accessible single-select control,
//! and the port the network adapters implement.

pub mod card;
pub mod config;
pub mod dropdown;
pub mod encoding;
pub mod error;
pub mod feed;
pub mod form;
pub mod models;
pub mod ports;
pub mod session;
pub mod validation;

pub use error::{IncidentError, Result};
