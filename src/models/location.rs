//! Location model for French municipalities

use crate::RecosanteError;
use serde::{Deserialize, Serialize};

/// A municipality selected during setup
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Location {
    /// INSEE code used as the query key against the data API
    pub insee: String,
    /// Display name (city)
    pub name: String,
}

/// One candidate returned by the geo.api.gouv.fr communes endpoint
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Commune {
    pub code: String,
    pub nom: String,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(insee: String, name: String) -> Self {
        Self { insee, name }
    }

    /// INSEE codes are five characters: digits, or `2A`/`2B` for Corsica.
    pub fn validate_insee(insee: &str) -> Result<(), RecosanteError> {
        let valid = insee.len() == 5
            && insee.chars().enumerate().all(|(i, c)| {
                c.is_ascii_digit() || (i == 1 && matches!(c, 'A' | 'B' | 'a' | 'b'))
            });
        if valid {
            Ok(())
        } else {
            Err(RecosanteError::validation(format!(
                "'{insee}' is not a valid INSEE code"
            )))
        }
    }
}

impl Commune {
    /// Key identifying this commune in a selection list: `"{code};{nom}"`
    #[must_use]
    pub fn place_key(&self) -> String {
        format!("{};{}", self.code, self.nom)
    }

    /// Parse a key produced by [`Commune::place_key`]
    pub fn from_place_key(key: &str) -> Result<Self, RecosanteError> {
        let (code, nom) = key
            .split_once(';')
            .ok_or_else(|| RecosanteError::validation(format!("malformed place key '{key}'")))?;
        if code.is_empty() {
            return Err(RecosanteError::validation(format!(
                "place key '{key}' has no INSEE code"
            )));
        }
        Ok(Self {
            code: code.to_string(),
            nom: nom.to_string(),
        })
    }
}

impl From<Commune> for Location {
    fn from(commune: Commune) -> Self {
        Location::new(commune.code, commune.nom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_place_key_round_trip() {
        let commune = Commune {
            code: "75056".to_string(),
            nom: "Paris".to_string(),
        };
        assert_eq!(commune.place_key(), "75056;Paris");
        assert_eq!(Commune::from_place_key("75056;Paris").unwrap(), commune);
    }

    #[test]
    fn test_place_key_keeps_semicolons_in_name() {
        let commune = Commune::from_place_key("01001;L'Abergement;Clémenciat").unwrap();
        assert_eq!(commune.code, "01001");
        assert_eq!(commune.nom, "L'Abergement;Clémenciat");
    }

    #[test]
    fn test_place_key_malformed() {
        assert!(Commune::from_place_key("75056").is_err());
        assert!(Commune::from_place_key(";Paris").is_err());
    }

    #[test]
    fn test_commune_into_location() {
        let location: Location = Commune {
            code: "33063".to_string(),
            nom: "Bordeaux".to_string(),
        }
        .into();
        assert_eq!(location, Location::new("33063".into(), "Bordeaux".into()));
    }

    #[rstest]
    #[case("75101", true)]
    #[case("2A004", true)]
    #[case("2b033", true)]
    #[case("7510", false)]
    #[case("751011", false)]
    #[case("75A01", false)]
    #[case("", false)]
    fn test_validate_insee(#[case] insee: &str, #[case] valid: bool) {
        assert_eq!(Location::validate_insee(insee).is_ok(), valid);
    }
}
