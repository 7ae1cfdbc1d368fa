//! Catalog of the readings exposed for every configured municipality

use crate::models::{DeviceClass, JsonKeys, ReadingDefinition, StateClass};

pub const ATTRIBUTION: &str = "Recosanté";
pub const MODEL: &str = "Recosanté API";
pub const TITLE: &str = "Recosanté";

const ICON_ALERT: &str = "mdi:alert-decagram";
const ICON_GAS: &str = "mdi:molecule";
const ICON_GRASS: &str = "mdi:grass";
const ICON_PARTICULATE: &str = "mdi:blur";
const ICON_TREE: &str = "mdi:tree";

const UV_INDEX: &str = "UV index";

/// AQI measurement with a `details` lookup
const fn detail(
    key: &'static str,
    name: &'static str,
    icon: &'static str,
    category: &'static str,
    label: Option<&'static str>,
) -> ReadingDefinition {
    ReadingDefinition {
        key,
        name,
        json_keys: JsonKeys {
            category,
            array: Some("details"),
            label,
        },
        device_class: Some(DeviceClass::Aqi),
        state_class: Some(StateClass::Measurement),
        unit: None,
        icon,
    }
}

/// Enumerated alert level, no device or state class
const fn alert(
    key: &'static str,
    name: &'static str,
    category: &'static str,
    array: Option<&'static str>,
    label: Option<&'static str>,
) -> ReadingDefinition {
    ReadingDefinition {
        key,
        name,
        json_keys: JsonKeys {
            category,
            array,
            label,
        },
        device_class: None,
        state_class: None,
        unit: None,
        icon: ICON_ALERT,
    }
}

const fn pollen(key: &'static str, name: &'static str, icon: &'static str) -> ReadingDefinition {
    detail(key, name, icon, "raep", Some(key))
}

pub static ATMO_SENSORS: [ReadingDefinition; 6] = [
    detail("no2", "Dioxyde d'azote", ICON_GAS, "indice_atmo", Some("NO2")),
    detail("o3", "Ozone", ICON_GAS, "indice_atmo", Some("O3")),
    detail("pm10", "PM10", ICON_PARTICULATE, "indice_atmo", Some("PM10")),
    detail("pm25", "PM25", ICON_PARTICULATE, "indice_atmo", Some("PM2,5")),
    detail("so2", "Dioxyde de soufre", ICON_GAS, "indice_atmo", Some("SO2")),
    alert("indice_atmo", "Indice ATMO de la qualité de l'air", "indice_atmo", None, None),
];

pub static METEO_SENSORS: [ReadingDefinition; 1] = [detail(
    "meteo",
    "Vigilance Météo",
    "mdi:cloud-alert",
    "vigilance_meteo",
    None,
)];

pub static POLLUTION_SENSORS: [ReadingDefinition; 4] = [
    alert(
        "ep_so2",
        "Épisode pollution dioxyde de soufre",
        "episodes_pollution",
        Some("details"),
        Some("Dioxyde de soufre"),
    ),
    alert(
        "ep_o3",
        "Épisode pollution ozone",
        "episodes_pollution",
        Some("details"),
        Some("Ozone"),
    ),
    alert(
        "ep_no2",
        "Épisode pollution dioxyde d'azote",
        "episodes_pollution",
        Some("details"),
        // typographic apostrophe, as published by the API
        Some("Dioxyde d\u{2019}azote"),
    ),
    alert(
        "ep_pm10",
        "Épisode pollution PM10",
        "episodes_pollution",
        Some("details"),
        Some("Particules PM10"),
    ),
];

pub static RADON_SENSORS: [ReadingDefinition; 1] = [ReadingDefinition {
    key: "radon",
    name: "Potentiel Radon",
    json_keys: JsonKeys {
        category: "potentiel_radon",
        array: None,
        label: None,
    },
    device_class: Some(DeviceClass::Aqi),
    state_class: Some(StateClass::Measurement),
    unit: None,
    icon: "mdi:radioactive",
}];

pub static RAEP_SENSORS: [ReadingDefinition; 19] = [
    pollen("noisetier", "Noisetier", ICON_TREE),
    pollen("aulne", "Aulne", ICON_TREE),
    pollen("peuplier", "Peuplier", ICON_TREE),
    pollen("saule", "Saule", ICON_TREE),
    pollen("frene", "Frêne", ICON_TREE),
    pollen("charme", "Charme", ICON_TREE),
    pollen("bouleau", "Bouleau", ICON_TREE),
    pollen("platane", "Platane", ICON_TREE),
    pollen("chene", "Chêne", ICON_TREE),
    pollen("olivier", "Olivier", ICON_TREE),
    pollen("tilleul", "Tilleul", ICON_TREE),
    pollen("chataignier", "Châtaignier", ICON_TREE),
    pollen("rumex", "Rumex (Oseille)", ICON_TREE),
    pollen("graminees", "Graminées", ICON_GRASS),
    pollen("plantain", "Plantain", ICON_GRASS),
    pollen("urticacees", "Urticacées", ICON_GRASS),
    pollen("armoises", "Armoises", ICON_GRASS),
    pollen("ambroisies", "Ambroisies", ICON_GRASS),
    alert("risque_allergie", "Risque d'allergie aux pollens", "raep", None, None),
];

pub static UV_SENSORS: [ReadingDefinition; 1] = [ReadingDefinition {
    key: "uv",
    name: "UV",
    json_keys: JsonKeys {
        category: "indice_uv",
        array: None,
        label: None,
    },
    device_class: None,
    state_class: Some(StateClass::Measurement),
    unit: Some(UV_INDEX),
    icon: "mdi:sunglasses",
}];

/// Every reading, in display order
pub fn all() -> impl Iterator<Item = &'static ReadingDefinition> {
    ATMO_SENSORS
        .iter()
        .chain(METEO_SENSORS.iter())
        .chain(POLLUTION_SENSORS.iter())
        .chain(RADON_SENSORS.iter())
        .chain(RAEP_SENSORS.iter())
        .chain(UV_SENSORS.iter())
}

/// Look a reading up by key
#[must_use]
pub fn find(key: &str) -> Option<&'static ReadingDefinition> {
    all().find(|definition| definition.key == key)
}
