//! Data models for the Recosanté adapter
//!
//! This module contains the core domain models organized by concern:
//! - Location: the configured municipality and geocoding candidates
//! - Document: the fetched API response and the lookups run on it
//! - Reading: static descriptors of the exposed readings

pub mod document;
pub mod location;
pub mod reading;

// Re-export all public types for convenient access
pub use document::{Document, ForecastWindow, Lookup};
pub use location::{Commune, Location};
pub use reading::{DeviceClass, JsonKeys, ReadingDefinition, StateClass};
