//! Location Resolution Module
//!
//! Turns what the user typed during setup (a postal code, optionally a
//! choice among the communes sharing it, or an INSEE code directly) into the
//! [`Location`] the coordinator polls for.

use crate::api::GeoApiClient;
use crate::models::{Commune, Location};
use crate::{RecosanteError, Result};
use tracing::debug;

/// Types of location input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationInput {
    /// INSEE code and display name, already known
    Insee { insee: String, city: String },
    /// Postal code, plus the commune to pick when several share it
    PostalCode {
        postal_code: String,
        commune: Option<String>,
    },
}

/// Service for resolving location inputs
pub struct LocationResolver;

impl LocationResolver {
    /// Resolve a location input into a structured Location
    pub async fn resolve_location(
        geo_client: &GeoApiClient,
        location_input: LocationInput,
    ) -> Result<Location> {
        debug!("Resolving location input: {:?}", location_input);

        let location = match location_input {
            LocationInput::Insee { insee, city } => {
                Location::validate_insee(&insee)?;
                Location::new(insee, city)
            }
            LocationInput::PostalCode {
                postal_code,
                commune,
            } => {
                let candidates = Self::candidates(geo_client, &postal_code).await?;
                Self::select(candidates, commune.as_deref())?
            }
        };

        debug!("Resolved location: {} ({})", location.name, location.insee);
        Ok(location)
    }

    /// Communes sharing a postal code
    pub async fn candidates(geo_client: &GeoApiClient, postal_code: &str) -> Result<Vec<Commune>> {
        Self::validate_postal_code(postal_code)?;
        geo_client.resolve_location(postal_code.trim()).await
    }

    /// Pick one commune among the candidates.
    ///
    /// A single candidate is taken as is. With several, `choice` must name
    /// one by INSEE code or by its `"code;nom"` place key.
    pub fn select(candidates: Vec<Commune>, choice: Option<&str>) -> Result<Location> {
        if let Some(choice) = choice {
            let wanted = match Commune::from_place_key(choice) {
                Ok(commune) => commune.code,
                Err(_) => choice.to_string(),
            };
            return candidates
                .into_iter()
                .find(|commune| commune.code == wanted)
                .map(Location::from)
                .ok_or_else(|| {
                    RecosanteError::validation(format!(
                        "'{choice}' is not one of the communes for this postal code"
                    ))
                });
        }

        let mut candidates = candidates;
        match candidates.len() {
            0 => Err(RecosanteError::resolution("no INSEE code found")),
            1 => Ok(candidates.remove(0).into()),
            _ => {
                let choices: Vec<String> = candidates
                    .iter()
                    .map(|c| format!("{} ({})", c.nom, c.code))
                    .collect();
                Err(RecosanteError::validation(format!(
                    "several communes share this postal code, pick one of: {}",
                    choices.join(", ")
                )))
            }
        }
    }

    /// French postal codes are five digits
    pub fn validate_postal_code(postal_code: &str) -> Result<()> {
        let postal_code = postal_code.trim();
        if postal_code.len() == 5 && postal_code.chars().all(|c| c.is_ascii_digit()) {
            Ok(())
        } else {
            Err(RecosanteError::validation(format!(
                "'{postal_code}' is not a valid postal code"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;

    fn commune(code: &str, nom: &str) -> Commune {
        Commune {
            code: code.to_string(),
            nom: nom.to_string(),
        }
    }

    #[test]
    fn test_single_candidate_is_selected() {
        let location = LocationResolver::select(vec![commune("33063", "Bordeaux")], None).unwrap();
        assert_eq!(location, Location::new("33063".into(), "Bordeaux".into()));
    }

    #[test]
    fn test_several_candidates_require_a_choice() {
        let candidates = vec![commune("01001", "L'Abergement-Clémenciat"), commune("01250", "Saint-André")];
        let err = LocationResolver::select(candidates, None).unwrap_err();
        assert!(matches!(err, RecosanteError::Validation { .. }));
        assert!(err.to_string().contains("Saint-André (01250)"));
    }

    #[rstest]
    #[case("01250")]
    #[case("01250;Saint-André")]
    fn test_choice_by_code_or_place_key(#[case] choice: &str) {
        let candidates = vec![commune("01001", "L'Abergement-Clémenciat"), commune("01250", "Saint-André")];
        let location = LocationResolver::select(candidates, Some(choice)).unwrap();
        assert_eq!(location.insee, "01250");
        assert_eq!(location.name, "Saint-André");
    }

    #[test]
    fn test_unknown_choice_is_rejected() {
        let candidates = vec![commune("01001", "A"), commune("01250", "B")];
        assert!(LocationResolver::select(candidates, Some("99999")).is_err());
    }

    #[test]
    fn test_no_candidates_is_a_resolution_error() {
        let err = LocationResolver::select(Vec::new(), None).unwrap_err();
        assert!(matches!(err, RecosanteError::Resolution { .. }));
    }

    #[rstest]
    #[case("75001", true)]
    #[case(" 33000 ", true)]
    #[case("7500", false)]
    #[case("75OO1", false)]
    fn test_validate_postal_code(#[case] postal_code: &str, #[case] valid: bool) {
        assert_eq!(LocationResolver::validate_postal_code(postal_code).is_ok(), valid);
    }

    #[tokio::test]
    async fn test_insee_input_skips_geocoding() {
        let geo = GeoApiClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let location = LocationResolver::resolve_location(
            &geo,
            LocationInput::Insee {
                insee: "75101".to_string(),
                city: "Paris".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(location.insee, "75101");
    }

    #[tokio::test]
    async fn test_invalid_postal_code_fails_before_request() {
        let geo = GeoApiClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = LocationResolver::resolve_location(
            &geo,
            LocationInput::PostalCode {
                postal_code: "abc".to_string(),
                commune: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RecosanteError::Validation { .. }));
    }
}
