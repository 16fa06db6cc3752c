/// Application name
pub const APP_NAME: &str = "Country Explorer";

/// Base URL of the REST Countries v3.1 API
pub const DEFAULT_API_BASE_URL: &str = "https://restcountries.com/v3.1";

/// Request timeout for the REST Countries API, in seconds
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 10;

/// Number of country cards per listing page
pub const DEFAULT_PAGE_SIZE: usize = 24;

/// Facet value meaning "no constraint"
pub const ALL: &str = "All";

/// Default HTTP port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;
