use std::future::Future;

use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::FinderConfig;
use crate::model::{
    Availability, GroupedHospitals, Hospital, HospitalSearchResponse, Location, LocationField,
};

pub const HOSPITALS_FALLBACK_MESSAGE: &str = "Failed to fetch hospitals";
pub const CONDITIONS_FALLBACK_MESSAGE: &str = "Failed to fetch health conditions";
pub const LOCATIONS_FALLBACK_MESSAGE: &str = "Failed to fetch locations";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx response. `message` is the backend's `{error}` text or the endpoint fallback.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Invalid response format from server")]
    InvalidResponse { detail: String },
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Request(e) => e.status(),
            ApiError::Upstream { status, .. } => Some(*status),
            ApiError::InvalidResponse { .. } => None,
        }
    }
}

/// Parameters of one hospital search round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HospitalQuery {
    pub location: String,
    pub health_issue: String,
    pub page: u32,
    pub per_page: u32,
}

/// The remote search backend, as seen by the client.
pub trait HospitalSearchApi: Send + Sync {
    fn search_hospitals(
        &self,
        query: &HospitalQuery,
    ) -> impl Future<Output = Result<HospitalSearchResponse, ApiError>> + Send;

    fn search_conditions(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;

    fn search_locations(
        &self,
        query: &str,
        field: LocationField,
    ) -> impl Future<Output = Result<Vec<Location>, ApiError>> + Send;
}

#[derive(Clone)]
pub struct SearchApiClient {
    config: FinderConfig,
    http: reqwest::Client,
}

impl SearchApiClient {
    pub fn new(config: FinderConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent("hospital-finder/finder-common")
            .build()?;
        Ok(Self { config, http })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.config.base_url);
        let request = self.http.get(url).header(ACCEPT, "application/json");
        match self.config.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    async fn read_success_body(
        &self,
        resp: reqwest::Response,
        fallback_message: &str,
    ) -> Result<Vec<u8>, ApiError> {
        if resp.status().is_success() {
            return Ok(resp.bytes().await?.to_vec());
        }
        Err(to_upstream_error(resp, fallback_message, self.config.max_error_body_bytes).await)
    }
}

impl HospitalSearchApi for SearchApiClient {
    async fn search_hospitals(
        &self,
        query: &HospitalQuery,
    ) -> Result<HospitalSearchResponse, ApiError> {
        debug!(
            location = %query.location,
            health_issue = %query.health_issue,
            page = query.page,
            per_page = query.per_page,
            "searching hospitals"
        );
        let page = query.page.to_string();
        let per_page = query.per_page.to_string();
        let resp = self
            .get("/hospitals/search")
            .query(&[
                ("location", query.location.as_str()),
                ("healthIssue", query.health_issue.as_str()),
                ("page", page.as_str()),
                ("per_page", per_page.as_str()),
            ])
            .send()
            .await?;

        let body = self
            .read_success_body(resp, HOSPITALS_FALLBACK_MESSAGE)
            .await
            .inspect_err(|e| warn!(error = %e, "hospital search failed"))?;
        let payload: SearchPayload = serde_json::from_slice(&body).map_err(|e| {
            warn!(error = %e, "hospital search returned an unexpected payload");
            ApiError::InvalidResponse {
                detail: e.to_string(),
            }
        })?;
        Ok(payload.normalize(query))
    }

    async fn search_conditions(&self, query: &str) -> Result<Vec<String>, ApiError> {
        debug!(query, "searching conditions");
        let resp = self
            .get("/conditions/search")
            .query(&[("query", query)])
            .send()
            .await?;
        let body = self
            .read_success_body(resp, CONDITIONS_FALLBACK_MESSAGE)
            .await
            .inspect_err(|e| warn!(error = %e, "condition search failed"))?;
        serde_json::from_slice::<Vec<String>>(&body).map_err(|e| ApiError::InvalidResponse {
            detail: e.to_string(),
        })
    }

    async fn search_locations(
        &self,
        query: &str,
        field: LocationField,
    ) -> Result<Vec<Location>, ApiError> {
        let query = query.trim();
        debug!(query, field = field.as_str(), "searching locations");
        let resp = self
            .get("/locations/search")
            .query(&[("query", query), ("field", field.as_str())])
            .send()
            .await?;
        let body = self
            .read_success_body(resp, LOCATIONS_FALLBACK_MESSAGE)
            .await
            .inspect_err(|e| warn!(error = %e, "location search failed"))?;
        let value: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| ApiError::InvalidResponse {
                detail: e.to_string(),
            })?;
        Ok(decode_locations(value))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchPayload {
    Flat(Vec<Hospital>),
    Paged(PagedPayload),
}

#[derive(Debug, Deserialize)]
struct PagedPayload {
    hospitals: HospitalsPayload,
    #[serde(default)]
    availability: Option<Availability>,
    #[serde(default)]
    total: Option<usize>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    per_page: Option<u32>,
    #[serde(default)]
    total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HospitalsPayload {
    Flat(Vec<Hospital>),
    Grouped(GroupedHospitals),
}

impl SearchPayload {
    fn normalize(self, query: &HospitalQuery) -> HospitalSearchResponse {
        match self {
            SearchPayload::Flat(list) => {
                let hospitals = GroupedHospitals::from_flat(list);
                let total = hospitals.total();
                HospitalSearchResponse {
                    availability: Availability::of(&hospitals),
                    hospitals,
                    total,
                    page: 1,
                    per_page: total.max(1) as u32,
                    total_pages: 1,
                }
            }
            SearchPayload::Paged(paged) => {
                let mut hospitals = match paged.hospitals {
                    HospitalsPayload::Flat(list) => GroupedHospitals::from_flat(list),
                    HospitalsPayload::Grouped(grouped) => grouped,
                };
                hospitals.backfill_relevance();
                let per_page = paged.per_page.unwrap_or(query.per_page).max(1);
                let total = paged.total.unwrap_or_else(|| hospitals.total());
                let total_pages = paged
                    .total_pages
                    .unwrap_or_else(|| total.div_ceil(per_page as usize) as u32)
                    .max(1);
                HospitalSearchResponse {
                    availability: paged
                        .availability
                        .unwrap_or_else(|| Availability::of(&hospitals)),
                    hospitals,
                    total,
                    page: paged.page.unwrap_or(query.page).max(1),
                    per_page,
                    total_pages,
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LocationEntry {
    Structured(Location),
    Plain(String),
}

fn decode_locations(value: serde_json::Value) -> Vec<Location> {
    let serde_json::Value::Array(entries) = value else {
        warn!("location search returned a non-array payload, treating as empty");
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| {
            serde_json::from_value::<LocationEntry>(entry)
                .inspect_err(|e| warn!(error = %e, "skipping malformed location entry"))
                .ok()
        })
        .map(|entry| match entry {
            LocationEntry::Structured(location) => location,
            LocationEntry::Plain(display) => Location::from_display(display),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
}

async fn to_upstream_error(
    resp: reqwest::Response,
    fallback_message: &str,
    max_error_body_bytes: usize,
) -> ApiError {
    let status = resp.status();
    let body = read_limited_text(resp, max_error_body_bytes).await;
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .and_then(|envelope| envelope.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| fallback_message.to_string());
    ApiError::Upstream { status, message }
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read upstream error body");
            String::new()
        }
    }
}
