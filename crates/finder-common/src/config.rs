use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_PER_PAGE: u32 = 10;
const DEFAULT_FALLBACK_LOCATION: &str = "New York, NY";

/// The one place the client resolves where the search backend lives and how it is called.
///
/// Built once at startup and handed to every component that needs it.
#[derive(Clone, Debug)]
pub struct FinderConfig {
    /// Backend base URL, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
    pub max_error_body_bytes: usize,
    /// Server page size requested by the results view.
    pub per_page: u32,
    /// Location reported for a successful geolocation until reverse geocoding exists.
    pub fallback_location: String,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
            max_error_body_bytes: 8 * 1024,
            per_page: DEFAULT_PER_PAGE,
            fallback_location: DEFAULT_FALLBACK_LOCATION.to_string(),
        }
    }
}

impl FinderConfig {
    /// Load configuration from environment variables. All are optional:
    /// - `HOSPITAL_API_BASE_URL` (default: "http://localhost:5000/api")
    /// - `HOSPITAL_API_TIMEOUT_SECS` (default: unset, no timeout)
    /// - `HOSPITAL_API_MAX_ERROR_BODY_BYTES` (default: 8192)
    /// - `FINDER_PER_PAGE` (default: 10)
    /// - `FINDER_FALLBACK_LOCATION` (default: "New York, NY")
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url =
            std::env::var("HOSPITAL_API_BASE_URL").unwrap_or_else(|_| defaults.base_url.clone());

        let request_timeout = std::env::var("HOSPITAL_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&n| n > 0)
            .map(Duration::from_secs);

        let max_error_body_bytes = std::env::var("HOSPITAL_API_MAX_ERROR_BODY_BYTES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.max_error_body_bytes);

        let per_page = std::env::var("FINDER_PER_PAGE")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(defaults.per_page);

        let fallback_location = std::env::var("FINDER_FALLBACK_LOCATION")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.fallback_location);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout,
            max_error_body_bytes,
            per_page,
            fallback_location,
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}
