use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use super::KeyLookup;
use crate::config::{CensusApiConfig, CENSUS_API_KEY_VAR};
use crate::error::{ConfigError, LookupError};

/// Census Bureau lookup: NAICS code -> industry title
pub struct NaicsClient {
    client: reqwest::Client,
    config: CensusApiConfig,
    api_key: String,
}

impl NaicsClient {
    /// Fails immediately when the API key is absent or blank
    pub fn new(
        config: &CensusApiConfig,
        client: reqwest::Client,
        api_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingCredential(CENSUS_API_KEY_VAR))?;

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    /// Read the key from `CENSUS_DATA_API_KEY`
    pub fn from_env(config: &CensusApiConfig, client: reqwest::Client) -> Result<Self, ConfigError> {
        Self::new(config, client, std::env::var(CENSUS_API_KEY_VAR).ok())
    }

    /// Request URL without the key, safe to log
    pub fn url_for(&self, naics_code: &str) -> String {
        let c = &self.config;
        let p = &c.parameters;
        format!(
            "{}/{}/{}?get={}&for={}&{}",
            c.base_url.trim_end_matches('/'),
            c.year,
            c.dataset,
            p.get,
            p.for_,
            p.naics_code.replace("{naics_code}", naics_code)
        )
    }

    /// Header name whose cell holds the title
    fn title_field(&self) -> &str {
        self.config.parameters.get.split(',').next().unwrap_or("").trim()
    }
}

#[async_trait]
impl KeyLookup for NaicsClient {
    fn service(&self) -> &'static str {
        "census-naics"
    }

    async fn lookup(&self, naics_code: &str) -> Result<Option<String>, LookupError> {
        let url = self.url_for(naics_code);
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| LookupError::Request(e.without_url()))?;

        match response.status() {
            StatusCode::OK => {}
            // The Census API answers 204 when nothing matches the filter
            StatusCode::NO_CONTENT => return Ok(None),
            status => {
                return Err(LookupError::HttpStatus {
                    status: status.as_u16(),
                    url,
                })
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| LookupError::Request(e.without_url()))?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| LookupError::Payload(format!("Census response for {}: {}", naics_code, e)))?;
        Ok(title_from_census_payload(&payload, self.title_field()))
    }
}

/// The payload is a header row followed by one data row. The title is the
/// data-row cell under `field`, or the first cell if the header lacks it.
pub fn title_from_census_payload(payload: &Value, field: &str) -> Option<String> {
    let rows = payload.as_array()?;
    let header = rows.first()?.as_array()?;
    let data = rows.get(1)?.as_array()?;

    let index = header
        .iter()
        .position(|h| h.as_str().is_some_and(|h| h.eq_ignore_ascii_case(field)))
        .unwrap_or(0);

    data.get(index)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
