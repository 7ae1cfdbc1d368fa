//! HTTP clients for the Recosanté data API and the geo.api.gouv.fr communes API
//!
//! Both clients are thin: one GET, one JSON decode. Neither retries; the
//! coordinator simply tries again on its next tick.

use crate::config::ApiConfig;
use crate::models::{Commune, Document};
use crate::{RecosanteError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

const USER_AGENT: &str = concat!("recosante/", env!("CARGO_PKG_VERSION"));

/// Source of Recosanté documents
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the current document for an INSEE code
    async fn fetch(&self, insee: &str) -> Result<Document>;
}

fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

fn trim_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Client for the Recosanté data API
#[derive(Debug, Clone)]
pub struct RecosanteClient {
    client: Client,
    base_url: String,
}

impl RecosanteClient {
    /// Create a new client against `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: trim_base(base_url),
        })
    }

    /// Create a client from the API configuration section
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(&config.base_url, config.timeout())
    }

    /// URL of the document for an INSEE code
    #[must_use]
    pub fn data_url(&self, insee: &str) -> String {
        format!(
            "{}/v1/?show_raep=true&show_indice_uv=true&insee={}",
            self.base_url,
            urlencoding::encode(insee)
        )
    }

    /// Fetch and decode the document for an INSEE code.
    ///
    /// An empty object is returned as an empty [`Document`], not as an error.
    #[instrument(skip(self))]
    pub async fn get_data(&self, insee: &str) -> Result<Document> {
        let url = self.data_url(insee);
        debug!("Getting data from {}", url);
        let start_time = Instant::now();

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!("Request to Recosanté failed for INSEE {}: {}", insee, e);
            RecosanteError::from(e)
        })?;
        let response = ensure_success(response).await?;
        let body = decode_json(response).await?;

        let document = Document::from_value(body).ok_or_else(|| {
            RecosanteError::parse("Recosanté response is not a JSON object")
        })?;

        if document.is_empty() {
            warn!("No data for INSEE {}", insee);
        } else {
            info!(
                "Fetched {} categories for INSEE {} in {:.3}s",
                document.len(),
                insee,
                start_time.elapsed().as_secs_f64()
            );
            debug!(
                "Categories: {:?}",
                document.categories().collect::<Vec<_>>()
            );
        }

        Ok(document)
    }
}

#[async_trait]
impl DataSource for RecosanteClient {
    async fn fetch(&self, insee: &str) -> Result<Document> {
        self.get_data(insee).await
    }
}

/// Client resolving postal codes to communes
#[derive(Debug, Clone)]
pub struct GeoApiClient {
    client: Client,
    base_url: String,
}

impl GeoApiClient {
    /// Create a new client against `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: trim_base(base_url),
        })
    }

    /// Create a client from the API configuration section
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(&config.geo_base_url, config.timeout())
    }

    /// URL of the communes lookup for a postal code
    #[must_use]
    pub fn communes_url(&self, postal_code: &str) -> String {
        format!(
            "{}/communes?codePostal={}&fields=code,nom&format=json&geometry=centre",
            self.base_url,
            urlencoding::encode(postal_code)
        )
    }

    /// Resolve a postal code to the communes sharing it.
    ///
    /// A non-OK status or an empty result is a resolution failure.
    #[instrument(skip(self))]
    pub async fn resolve_location(&self, postal_code: &str) -> Result<Vec<Commune>> {
        let url = self.communes_url(postal_code);
        debug!("Resolving postal code via {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            error!("Failed to get INSEE data, with status {}", status);
            return Err(RecosanteError::resolution(format!(
                "geo API answered HTTP {} for postal code {}",
                status.as_u16(),
                postal_code
            )));
        }

        let body = decode_json(response).await?;
        let communes: Vec<Commune> = serde_json::from_value(body)
            .map_err(|e| RecosanteError::parse(format!("Invalid communes list: {e}")))?;

        if communes.is_empty() {
            error!("No INSEE value fetched for {}", postal_code);
            return Err(RecosanteError::resolution(format!(
                "no INSEE code found for postal code {postal_code}"
            )));
        }

        debug!(
            "Got {} communes for {}: {:?}",
            communes.len(),
            postal_code,
            communes.iter().map(Commune::place_key).collect::<Vec<_>>()
        );
        Ok(communes)
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = format!(
        "request failed with status: {} - {}",
        status,
        status.canonical_reason().unwrap_or("Unknown error")
    );
    warn!("{}", message);
    Err(RecosanteError::api(status.as_u16(), message))
}

async fn decode_json(response: Response) -> Result<Value> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        error!("Failed to parse response body: {}", e);
        RecosanteError::parse(format!("Malformed JSON body: {e}"))
    })
}
