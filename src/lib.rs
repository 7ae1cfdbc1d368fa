//! `Recosante` - Environmental health readings for French municipalities
//!
//! This library polls the Recosanté API for one municipality and exposes
//! air quality, pollen, UV, radon and alert levels as individual readings.

pub mod api;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod sensor;

// Re-export core types for public API
pub use api::{DataSource, GeoApiClient, RecosanteClient};
pub use config::RecosanteConfig;
pub use coordinator::{RefreshCoordinator, RefreshOutcome, Snapshot, UpdateStatus};
pub use error::RecosanteError;
pub use location_resolver::{LocationInput, LocationResolver};
pub use models::{Commune, Document, Location, ReadingDefinition};
pub use sensor::{ReadingState, Sensor};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, RecosanteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
