//! The document returned by the Recosanté API and the lookups readings run on it
//!
//! A document is a JSON object keyed by category (`indice_atmo`, `raep`,
//! `indice_uv`, ...). Each category carries an `indice` payload, a list of
//! `sources` and a `validity` block:
//!
//! ```json
//! {
//!   "indice_atmo": {
//!     "indice": { "value": 2, "label": "Moyen", "details": [ { "label": "O3", "indice": { "value": 2 } } ] },
//!     "sources": [ { "label": "Airparif" } ],
//!     "validity": { "start": "2024-01-01", "end": "2024-01-02", "area": "Paris" }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const INDICE: &str = "indice";
const LABEL: &str = "label";
const SOURCES: &str = "sources";
const VALIDITY: &str = "validity";

/// Result of resolving a reading path inside a document
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    /// The path resolved to this value
    Found(&'a Value),
    /// The category exists but the requested entry does not
    NotFound,
    /// No document, or the category is absent from it
    Unavailable,
}

impl<'a> Lookup<'a> {
    /// The resolved value, if any
    #[must_use]
    pub fn found(self) -> Option<&'a Value> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound | Lookup::Unavailable => None,
        }
    }
}

/// Start and end of the period a category's values are valid for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastWindow {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// One fetched API response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Decode a document from a JSON value; anything but an object is rejected
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// A document with no categories carries no usable data
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of categories
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Names of the categories present
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn category(&self, category: &str) -> Option<&Map<String, Value>> {
        self.0.get(category).and_then(Value::as_object)
    }

    /// Resolve the raw value for a `(category, array, label)` path.
    ///
    /// Without `array`, this is the category's `indice` payload. With `array`,
    /// the first entry of `indice[array]` whose label equals `label` wins and
    /// its own `indice` is returned when it has one. When `array` is missing
    /// from `indice` altogether, the whole `indice` payload is returned.
    #[must_use]
    pub fn value(&self, category: &str, array: Option<&str>, label: Option<&str>) -> Lookup<'_> {
        let Some(category) = self.category(category) else {
            return Lookup::Unavailable;
        };
        let Some(indice) = category.get(INDICE) else {
            return Lookup::NotFound;
        };

        let entries = array.and_then(|array| indice.as_object().and_then(|map| map.get(array)));
        let Some(entries) = entries else {
            return Lookup::Found(indice);
        };

        entries
            .as_array()
            .and_then(|entries| entries.iter().find(|entry| label_matches(entry, label)))
            .map_or(Lookup::NotFound, |entry| {
                Lookup::Found(entry.get(INDICE).unwrap_or(entry))
            })
    }

    /// Data providers for a category, joined with `", "`
    #[must_use]
    pub fn source(&self, category: &str) -> Option<String> {
        let sources = self.category(category)?.get(SOURCES)?.as_array()?;
        let labels: Vec<&str> = sources
            .iter()
            .filter_map(|source| source.get(LABEL).and_then(Value::as_str))
            .collect();
        Some(labels.join(", "))
    }

    /// Forecast validity dates of a category
    #[must_use]
    pub fn forecast_window(&self, category: &str) -> ForecastWindow {
        let Some(validity) = self.category(category).and_then(|c| c.get(VALIDITY)) else {
            return ForecastWindow::default();
        };
        ForecastWindow {
            start: validity.get("start").and_then(scalar_text),
            end: validity.get("end").and_then(scalar_text),
        }
    }

    /// Human-readable description of the area the values apply to
    #[must_use]
    pub fn validity(&self, category: &str) -> Option<String> {
        let validity = self.category(category)?.get(VALIDITY)?;
        match validity.get("area_details").filter(|details| details.is_object()) {
            Some(details) => {
                let field = |name: &str| details.get(name).and_then(scalar_text).unwrap_or_default();
                Some(format!(
                    "{} {}{}",
                    capitalize(&field("type")),
                    field("charniere"),
                    field("nom")
                ))
            }
            None => validity.get("area").and_then(scalar_text),
        }
    }
}

// A missing label only matches entries whose own label is null or absent.
fn label_matches(entry: &Value, label: Option<&str>) -> bool {
    match (entry.get(LABEL), label) {
        (Some(Value::String(actual)), Some(wanted)) => actual == wanted,
        (None | Some(Value::Null), None) => true,
        _ => false,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

// First character upper-cased, the rest lower-cased.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
