//! Stateless HTTP request builder and response parser for the catalog API.
//!
//! # Design
//! `CatalogClient` holds only a `base_url` and the per-request timeout and
//! carries no mutable state between calls. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`. The caller executes the actual HTTP round-trip,
//! keeping the core deterministic and free of I/O dependencies.

use std::time::Duration;

use url::Url;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{Character, CharacterFilters, CharacterPage};

/// Public catalog endpoint.
pub const DEFAULT_BASE_URL: &str = "https://rickandmortyapi.com/api";

/// Upper bound on a single request round-trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Synchronous, stateless client for the character catalog.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
    timeout: Duration,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Request for one page of characters.
    ///
    /// Filter values are lower-cased and omitted entirely when blank.
    pub fn build_list_characters(
        &self,
        page: u32,
        filters: &CharacterFilters,
    ) -> Result<HttpRequest, ApiError> {
        if page == 0 {
            return Err(ApiError::InvalidArgument("page must be >= 1".to_string()));
        }
        let mut url = self.endpoint("character")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page", &page.to_string());
            for (name, value) in [("status", &filters.status), ("species", &filters.species)] {
                let value = value.trim();
                if !value.is_empty() {
                    query.append_pair(name, &value.to_lowercase());
                }
            }
        }
        Ok(self.get(url))
    }

    pub fn build_get_character(&self, id: u32) -> Result<HttpRequest, ApiError> {
        if id == 0 {
            return Err(ApiError::InvalidArgument("Invalid character ID".to_string()));
        }
        let url = self.endpoint(&format!("character/{id}"))?;
        Ok(self.get(url))
    }

    /// A 404 here means "no character matches" and yields an empty page.
    pub fn parse_list_characters(&self, response: HttpResponse) -> Result<CharacterPage, ApiError> {
        if response.status == 404 {
            return Ok(CharacterPage::empty());
        }
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }

    pub fn parse_get_character(&self, response: HttpResponse) -> Result<Character, ApiError> {
        if response.status == 404 {
            return Err(ApiError::NotFound);
        }
        check_status(&response)?;
        let character: Character = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
        if character.id == 0 || character.name.trim().is_empty() {
            return Err(ApiError::MalformedResponse(
                "character is missing its id or name".to_string(),
            ));
        }
        Ok(character)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Url::parse(&format!("{}/{path}", self.base_url))
            .map_err(|e| ApiError::InvalidArgument(format!("invalid base url {}: {e}", self.base_url)))
    }

    fn get(&self, url: Url) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: url.into(),
            headers: vec![("accept".to_string(), "application/json".to_string())],
            timeout: self.timeout,
        }
    }
}

/// Map non-200 statuses to `ApiError::Http`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.status == 200 {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}
