//! Static descriptors of the readings derived from a document

use serde::Serialize;

/// Path of a reading inside the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JsonKeys {
    /// Top-level category, e.g. `indice_atmo`
    pub category: &'static str,
    /// List inside the category's `indice` to search, e.g. `details`
    pub array: Option<&'static str>,
    /// Label of the entry to pick in `array`
    pub label: Option<&'static str>,
}

/// Kind of quantity a reading represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Aqi,
}

/// How a host should treat successive states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
}

/// One entry of the reading catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadingDefinition {
    /// Stable identifier
    pub key: &'static str,
    /// Display name
    pub name: &'static str,
    pub json_keys: JsonKeys,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
    pub unit: Option<&'static str>,
    pub icon: &'static str,
}
