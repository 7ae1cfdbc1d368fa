//! Readings rendered from a document snapshot
//!
//! A [`Sensor`] pairs one catalog entry with the configured location. It owns
//! no data: every render borrows whatever snapshot the coordinator currently
//! publishes.

use crate::catalog::{self, ATTRIBUTION, MODEL, TITLE};
use crate::coordinator::Snapshot;
use crate::models::{
    DeviceClass, Document, ForecastWindow, Location, Lookup, ReadingDefinition, StateClass,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Attributes shown alongside a reading's state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReadingAttributes {
    pub forecast_start: Option<String>,
    pub forecast_end: Option<String>,
    pub label: Option<String>,
    pub area_validity: Option<String>,
    pub attribution: String,
}

/// Service device the readings are grouped under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: &'static str,
    pub manufacturer: Option<String>,
    pub model: &'static str,
}

/// Everything a host needs to display one reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingState {
    pub key: &'static str,
    pub unique_id: String,
    pub name: String,
    /// `None` when the reading is unavailable
    pub value: Option<Value>,
    pub unit: Option<&'static str>,
    pub icon: &'static str,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
    pub attributes: ReadingAttributes,
    pub device: DeviceInfo,
}

impl ReadingState {
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Sensor {
    definition: &'static ReadingDefinition,
    location: Location,
    name: String,
    unique_id: String,
}

impl Sensor {
    #[must_use]
    pub fn new(definition: &'static ReadingDefinition, location: Location) -> Self {
        let name = format!("{} - {}", definition.name, location.name);
        let unique_id = format!("{} - {}", location.insee, definition.key);
        debug!("Creating a Recosanté sensor, named {}", name);
        Self {
            definition,
            location,
            name,
            unique_id,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// The raw object the reading's path resolves to
    #[must_use]
    pub fn raw_value<'a>(&self, document: Option<&'a Document>) -> Lookup<'a> {
        let keys = &self.definition.json_keys;
        document.map_or(Lookup::Unavailable, |doc| {
            doc.value(keys.category, keys.array, keys.label)
        })
    }

    /// State value: the raw object's `value`, else its `level`.
    ///
    /// A `value` key holding null wins over `level`.
    #[must_use]
    pub fn native_value(&self, document: Option<&Document>) -> Option<Value> {
        let raw = self.raw_value(document).found()?.as_object()?;
        let value = raw
            .get("value")
            .or_else(|| raw.get("level"))
            .filter(|value| !value.is_null())
            .cloned();
        debug!("Value for sensor {} is now {:?}", self.name, value);
        value
    }

    /// Textual label of the raw object, if it has one
    #[must_use]
    pub fn label(&self, document: Option<&Document>) -> Option<String> {
        let raw = self.raw_value(document).found()?.as_object()?;
        if raw.is_empty() {
            return None;
        }
        match raw.get("label")? {
            Value::Null => None,
            Value::String(label) => Some(label.clone()),
            other => Some(other.to_string()),
        }
    }

    #[must_use]
    pub fn source(&self, document: Option<&Document>) -> Option<String> {
        document.and_then(|doc| doc.source(self.definition.json_keys.category))
    }

    #[must_use]
    pub fn attribution(&self, document: Option<&Document>) -> String {
        match self.source(document) {
            Some(source) => format!("{ATTRIBUTION} - {source}"),
            None => ATTRIBUTION.to_string(),
        }
    }

    #[must_use]
    pub fn attributes(&self, document: Option<&Document>) -> ReadingAttributes {
        let category = self.definition.json_keys.category;
        let ForecastWindow { start, end } = document
            .map(|doc| doc.forecast_window(category))
            .unwrap_or_default();
        ReadingAttributes {
            forecast_start: start,
            forecast_end: end,
            label: self.label(document),
            area_validity: document.and_then(|doc| doc.validity(category)),
            attribution: self.attribution(document),
        }
    }

    #[must_use]
    pub fn device_info(&self, document: Option<&Document>) -> DeviceInfo {
        let manufacturer = self.source(document);
        let identifier = match &manufacturer {
            Some(source) => format!("{source} - {}", self.location.name),
            None => self.location.name.clone(),
        };
        DeviceInfo {
            identifier,
            name: TITLE,
            manufacturer,
            model: MODEL,
        }
    }

    /// Render state and attributes from one document
    #[must_use]
    pub fn render(&self, document: Option<&Document>) -> ReadingState {
        ReadingState {
            key: self.definition.key,
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            value: self.native_value(document),
            unit: self.definition.unit,
            icon: self.definition.icon,
            device_class: self.definition.device_class,
            state_class: self.definition.state_class,
            attributes: self.attributes(document),
            device: self.device_info(document),
        }
    }
}

/// One sensor per catalog entry for a location
#[must_use]
pub fn sensors_for(location: &Location) -> Vec<Sensor> {
    catalog::all()
        .map(|definition| Sensor::new(definition, location.clone()))
        .collect()
}

/// Render every sensor against the same snapshot
#[must_use]
pub fn render_all(sensors: &[Sensor], snapshot: &Snapshot) -> Vec<ReadingState> {
    let document = snapshot.as_deref();
    sensors.iter().map(|sensor| sensor.render(document)).collect()
}
