use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tracing::info;

use finder_common::autocomplete::LOCATION_MIN_QUERY_LEN;
use finder_common::booking::{parse_form_date, BookingRequest, BookingService, MockBookingService};
use finder_common::error::FinderError;
use finder_common::filter::FilterState;
use finder_common::intake::SearchRequest;
use finder_common::mcp_api::{
    BookAppointmentParams, BookAppointmentResponse, HospitalMetricsParams,
    HospitalMetricsResponse, SearchConditionsParams, SearchConditionsResponse,
    SearchHospitalsParams, SearchHospitalsResponse, SearchLocationsParams,
    SearchLocationsResponse,
};
use finder_common::metrics::HospitalMetrics;
use finder_common::results::ResultsView;
use finder_common::search_api::{HospitalSearchApi, SearchApiClient};

use crate::config::Config;
use crate::error::AppError;

const MAX_PER_PAGE: u32 = 100;

#[derive(Clone)]
pub struct HospitalFinderServer {
    api: Arc<SearchApiClient>,
    booking: Arc<MockBookingService>,
    per_page: u32,
    tool_router: ToolRouter<HospitalFinderServer>,
}

impl HospitalFinderServer {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let api = SearchApiClient::new(config.finder.clone())?;
        Ok(Self {
            api: Arc::new(api),
            booking: Arc::new(MockBookingService::new()),
            per_page: config.finder.per_page,
            tool_router: Self::tool_router(),
        })
    }
}

#[tool_router]
impl HospitalFinderServer {
    #[tool(description = "Search hospitals near a location for a health issue. Results are grouped \
                          into city, state and other hospitals, one server page at a time, and can \
                          be narrowed and re-sorted within the page.")]
    async fn search_hospitals(
        &self,
        Parameters(params): Parameters<SearchHospitalsParams>,
    ) -> Result<Json<SearchHospitalsResponse>, String> {
        let response = search(self.api.as_ref(), params, self.per_page)
            .await
            .map_err(|e| format!("search failed: {e}"))?;
        info!(
            total = response.total,
            page = response.pagination.page,
            "search_hospitals served"
        );
        Ok(Json(response))
    }

    #[tool(description = "Suggest health conditions matching a partial name.")]
    async fn search_conditions(
        &self,
        Parameters(params): Parameters<SearchConditionsParams>,
    ) -> Result<Json<SearchConditionsResponse>, String> {
        let conditions = conditions(self.api.as_ref(), &params.query)
            .await
            .map_err(|e| format!("condition search failed: {e}"))?;
        Ok(Json(SearchConditionsResponse { conditions }))
    }

    #[tool(description = "Suggest locations matching a partial city, state or county name. \
                          Queries shorter than 2 characters return no suggestions.")]
    async fn search_locations(
        &self,
        Parameters(params): Parameters<SearchLocationsParams>,
    ) -> Result<Json<SearchLocationsResponse>, String> {
        let query = params.query.trim();
        if query.chars().count() < LOCATION_MIN_QUERY_LEN {
            return Ok(Json(SearchLocationsResponse {
                locations: Vec::new(),
            }));
        }
        let locations = self
            .api
            .search_locations(query, params.field.unwrap_or_default())
            .await
            .map_err(|e| format!("location search failed: {e}"))?;
        Ok(Json(SearchLocationsResponse { locations }))
    }

    #[tool(description = "Book an appointment at a hospital. This is a local stub: it validates \
                          the date and time slot and returns a confirmation, nothing is stored.")]
    async fn book_appointment(
        &self,
        Parameters(params): Parameters<BookAppointmentParams>,
    ) -> Result<Json<BookAppointmentResponse>, String> {
        book(self.booking.as_ref(), &params)
            .map(Json)
            .map_err(|e| format!("booking failed: {e}"))
    }

    #[tool(description = "Average score, average quality rating and score histogram for one page \
                          of hospital search results.")]
    async fn hospital_metrics(
        &self,
        Parameters(params): Parameters<HospitalMetricsParams>,
    ) -> Result<Json<HospitalMetricsResponse>, String> {
        let request = SearchRequest {
            location: params.location.trim().to_string(),
            health_issue: params.health_issue.trim().to_string(),
        };
        let mut view = load_page(
            self.api.as_ref(),
            request,
            params.page.unwrap_or(1),
            self.per_page,
            FilterState::default(),
        )
        .await
        .map_err(|e| format!("metrics failed: {e}"))?;
        let metrics = HospitalMetrics::from_hospitals(view.filtered().iter());
        Ok(Json(HospitalMetricsResponse { metrics }))
    }
}

#[tool_handler]
impl ServerHandler for HospitalFinderServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "hospital-finder".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Hospital finder MCP server. Use search_locations and search_conditions to \
                 resolve what the user means, search_hospitals for grouped results with \
                 filtering and sorting, hospital_metrics for a page summary, and \
                 book_appointment to confirm a visit (stub, nothing is stored)."
                    .to_string(),
            ),
        }
    }
}

/// Fetch one server page through a fresh results view.
async fn load_page<A: HospitalSearchApi>(
    api: &A,
    request: SearchRequest,
    page: u32,
    per_page: u32,
    filters: FilterState,
) -> Result<ResultsView, FinderError> {
    let mut view = ResultsView::new(Some(request), per_page);
    view.start_at_page(page);
    view.set_filters(filters);
    view.load(api).await;
    if let Some(message) = view.error() {
        return Err(FinderError::Results(message.to_string()));
    }
    Ok(view)
}

async fn search<A: HospitalSearchApi>(
    api: &A,
    params: SearchHospitalsParams,
    default_per_page: u32,
) -> Result<SearchHospitalsResponse, FinderError> {
    let filters = FilterState {
        location: params.location_scope.unwrap_or_default(),
        performance: params.performance.unwrap_or_default(),
        sort_by: params.sort_by.unwrap_or_default(),
        only_with_data: params.only_with_data.unwrap_or(false),
        ..FilterState::default()
    };
    let request = SearchRequest {
        location: params.location.trim().to_string(),
        health_issue: params.health_issue.trim().to_string(),
    };
    let per_page = params.per_page.unwrap_or(default_per_page).clamp(1, MAX_PER_PAGE);

    let mut view = load_page(api, request, params.page.unwrap_or(1), per_page, filters).await?;
    let hospitals = view.filtered().clone();
    Ok(SearchHospitalsResponse {
        hospitals,
        availability: view.availability(),
        total: view.total(),
        pagination: *view.pages(),
        filters: *view.filters(),
        active_filters: view.filters().active_chips(),
    })
}

async fn conditions<A: HospitalSearchApi>(api: &A, query: &str) -> Result<Vec<String>, FinderError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    Ok(api.search_conditions(query).await?)
}

fn book(
    service: &impl BookingService,
    params: &BookAppointmentParams,
) -> Result<BookAppointmentResponse, FinderError> {
    let request = BookingRequest {
        hospital_name: params.hospital_name.trim().to_string(),
        date: parse_form_date(&params.date)?,
        time_slot: Some(params.time_slot.clone()),
    };
    let confirmation = service.book(&request)?;
    Ok(BookAppointmentResponse {
        notification: confirmation.notification(),
        confirmation,
    })
}
