use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use super::KeyLookup;
use crate::config::FrsApiConfig;
use crate::error::LookupError;

/// Facility Registry Service lookup: registry id -> primary NAICS code
pub struct FrsClient {
    client: reqwest::Client,
    config: FrsApiConfig,
}

impl FrsClient {
    pub fn new(config: &FrsApiConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    /// Facility site filtered by registry id, joined to its interests and
    /// their NAICS codes, restricted to the primary code.
    pub fn url_for(&self, registry_id: &str) -> String {
        let c = &self.config;
        let q = &c.query_parameters;
        let endpoint = format!(
            "{}/{}",
            c.endpoints.frs_facility_site,
            q.registry_id_equals.replace("{frs_registry_id}", registry_id)
        );
        let join = format!(
            "{}/{}/{}/{}",
            q.join_type, c.endpoints.frs_interest, q.join_type, c.endpoints.frs_naics
        );
        let primary = format!("{}/{}/{}", q.primary_indicator_equals, q.first_last, q.format);

        format!(
            "{}/{}/{}/{}",
            c.base_url.trim_end_matches('/'),
            endpoint,
            join,
            primary
        )
    }
}

#[async_trait]
impl KeyLookup for FrsClient {
    fn service(&self) -> &'static str {
        "frs"
    }

    async fn lookup(&self, registry_id: &str) -> Result<Option<String>, LookupError> {
        let url = self.url_for(registry_id);
        let response = self.client.get(&url).send().await?;

        if response.status() != StatusCode::OK {
            return Err(LookupError::HttpStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| LookupError::Payload(format!("FRS response for {}: {}", registry_id, e)))?;
        Ok(naics_from_frs_payload(&payload))
    }
}

/// First row's `naics_code`; field names are matched case-insensitively and
/// numeric codes are accepted.
pub fn naics_from_frs_payload(payload: &Value) -> Option<String> {
    let first = payload.as_array()?.first()?.as_object()?;
    let value = first
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("naics_code"))
        .map(|(_, v)| v)?;

    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
