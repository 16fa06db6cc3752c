//! REST Countries data client.
//!
//! Four parameterized GET requests against a fixed base URL:
//! `/all`, `/name/{name}`, `/region/{region}` and `/alpha/{code}`.
//! Requests are one-shot: no retries, and the only cancellation is the
//! client timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use thiserror::Error;
use tracing::{debug, warn};

use explorer_shared::constants::{DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS};
use explorer_shared::{Country, CountryCode};

/// Fields every partial `/all?fields=` request must include so the records
/// still deserialize as [`Country`].
const REQUIRED_FIELDS: [&str; 2] = ["cca3", "name"];

/// Fields the list pages read: cards, stats and facets. The live API
/// refuses a bare `/all` and caps a `fields=` list at ten entries.
pub const LISTING_FIELDS: [&str; 9] = [
    "cca3",
    "name",
    "population",
    "region",
    "subregion",
    "capital",
    "flags",
    "languages",
    "currencies",
];

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("Not found")]
    NotFound,

    #[error("Invalid response body: {0}")]
    Decode(String),
}

/// Read access to the country dataset.
#[async_trait]
pub trait CountryApi: Send + Sync {
    /// Every country.
    async fn all(&self) -> Result<Vec<Country>, ApiError>;

    /// Every country, restricted to the named fields. `cca3` and `name` are
    /// always requested.
    async fn all_with_fields(&self, fields: &[&str]) -> Result<Vec<Country>, ApiError>;

    async fn by_name(&self, name: &str) -> Result<Vec<Country>, ApiError>;

    async fn by_region(&self, region: &str) -> Result<Vec<Country>, ApiError>;

    /// The country with `code`, or `None` when the API knows no such code.
    async fn by_code(&self, code: &CountryCode) -> Result<Option<Country>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
        }
    }
}

/// [`CountryApi`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct RestCountriesClient {
    base_url: Url,
    http: reqwest::Client,
}

impl RestCountriesClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(config.base_url.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("country-explorer/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_list(&self, url: Url) -> Result<Vec<Country>, ApiError> {
        debug!(url = %url, "GET");

        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "REST Countries request failed");
            return Err(ApiError::Status(status.as_u16()));
        }

        let body = resp.bytes().await?;
        let countries: Vec<Country> =
            serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

        debug!(url = %url, count = countries.len(), "REST Countries response");
        Ok(countries)
    }
}

#[async_trait]
impl CountryApi for RestCountriesClient {
    async fn all(&self) -> Result<Vec<Country>, ApiError> {
        self.get_list(self.endpoint(&["all"])).await
    }

    async fn all_with_fields(&self, fields: &[&str]) -> Result<Vec<Country>, ApiError> {
        let mut wanted: Vec<&str> = REQUIRED_FIELDS.to_vec();
        for field in fields {
            if !wanted.contains(field) {
                wanted.push(*field);
            }
        }

        let mut url = self.endpoint(&["all"]);
        url.query_pairs_mut().append_pair("fields", &wanted.join(","));
        self.get_list(url).await
    }

    async fn by_name(&self, name: &str) -> Result<Vec<Country>, ApiError> {
        self.get_list(self.endpoint(&["name", name])).await
    }

    async fn by_region(&self, region: &str) -> Result<Vec<Country>, ApiError> {
        self.get_list(self.endpoint(&["region", region])).await
    }

    async fn by_code(&self, code: &CountryCode) -> Result<Option<Country>, ApiError> {
        match self.get_list(self.endpoint(&["alpha", code.as_str()])).await {
            Ok(countries) => Ok(countries.into_iter().next()),
            Err(ApiError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
