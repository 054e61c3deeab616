//! Core data types and models for 6 GHz AFC (Automated Frequency
//! Coordination) analysis.
//!
//! This crate provides:
//! - Semantic types for FS links, passive repeaters, channels, and scan points
//! - Enums for regions, height sources, antenna categories, and morphology
//! - Spectral-overlap arithmetic and the UNII band table
//! - The shared error taxonomy used across the workspace

pub mod band;
pub mod catalog;
pub mod channel;
pub mod codes;
pub mod error;
pub mod link;
pub mod location;
pub mod result;

pub use band::*;
pub use catalog::*;
pub use channel::*;
pub use codes::*;
pub use error::{Error, Result};
pub use link::*;
pub use location::*;
pub use result::*;
