//! Results view orchestration: `idle → loading → (success | error)`.
//!
//! The view owns the server page position and the fetched page; filtering and sorting
//! are local to that page. Every fetch carries a generation ticket so a late response
//! for a superseded query or page is dropped instead of overwriting newer state.

use tracing::{debug, info, warn};

use crate::filter::{apply_filters, FilterKey, FilterState};
use crate::generation::{GenerationGate, Ticket};
use crate::intake::SearchRequest;
use crate::model::{Availability, GroupedHospitals, HospitalSearchResponse};
use crate::notify::Notification;
use crate::pagination::PageState;
use crate::search_api::{ApiError, HospitalQuery, HospitalSearchApi, HOSPITALS_FALLBACK_MESSAGE};

pub const MISSING_LOCATION_MESSAGE: &str = "Please select a location to search for hospitals.";
pub const FETCH_FAILED_NOTICE: &str = "Failed to fetch hospitals. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsPhase {
    Idle,
    Loading,
    Success,
    Error(String),
}

/// A fetch the caller should perform, tagged with the ticket to complete it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub ticket: Ticket,
    pub query: HospitalQuery,
}

struct Derived {
    data_version: u64,
    filters: FilterState,
    output: GroupedHospitals,
}

pub struct ResultsView {
    request: Option<SearchRequest>,
    pages: PageState,
    hospitals: GroupedHospitals,
    availability: Availability,
    total: usize,
    filters: FilterState,
    phase: ResultsPhase,
    gate: GenerationGate,
    data_version: u64,
    derived: Option<Derived>,
}

impl ResultsView {
    pub fn new(request: Option<SearchRequest>, per_page: u32) -> Self {
        Self {
            request,
            pages: PageState::new(per_page),
            hospitals: GroupedHospitals::default(),
            availability: Availability::default(),
            total: 0,
            filters: FilterState::default(),
            phase: ResultsPhase::Idle,
            gate: GenerationGate::new(),
            data_version: 0,
            derived: None,
        }
    }

    pub fn request(&self) -> Option<&SearchRequest> {
        self.request.as_ref()
    }

    pub fn phase(&self) -> &ResultsPhase {
        &self.phase
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            ResultsPhase::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn pages(&self) -> &PageState {
        &self.pages
    }

    pub fn hospitals(&self) -> &GroupedHospitals {
        &self.hospitals
    }

    pub fn availability(&self) -> Availability {
        self.availability
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Replace the query. Returns `true` when it changed and a new fetch is due.
    pub fn set_request(&mut self, request: Option<SearchRequest>) -> bool {
        if self.request == request {
            return false;
        }
        self.request = request;
        self.pages.page = 1;
        self.phase = ResultsPhase::Idle;
        true
    }

    /// Move to `page`, clamped to `[1, total_pages]`. Returns `true` when a new fetch is due.
    pub fn set_page(&mut self, page: u32) -> bool {
        let page = self.pages.clamp(page);
        if page == self.pages.page {
            return false;
        }
        self.pages.page = page;
        self.phase = ResultsPhase::Idle;
        true
    }

    /// Restore a page from navigation state before the first fetch, when the total is
    /// not yet known. The server response settles the real bounds.
    pub fn start_at_page(&mut self, page: u32) {
        self.pages.page = page.max(1);
    }

    pub fn previous_page(&mut self) -> bool {
        self.set_page(self.pages.previous_page())
    }

    pub fn next_page(&mut self) -> bool {
        self.set_page(self.pages.next_page())
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
    }

    pub fn update_filters(&mut self, update: impl FnOnce(&mut FilterState)) {
        update(&mut self.filters);
    }

    pub fn reset_filter(&mut self, key: FilterKey) {
        self.filters.reset_key(key);
    }

    /// Back to defaults. Filtering is local to the fetched page, so nothing is re-fetched.
    pub fn reset_filters(&mut self) {
        self.filters.reset();
    }

    /// Enter `loading` for the current query and page, or go straight to `error` when
    /// there is no location to search for.
    pub fn begin_fetch(&mut self) -> Option<FetchPlan> {
        let Some(request) = self
            .request
            .as_ref()
            .filter(|r| !r.location.trim().is_empty())
        else {
            self.gate.invalidate();
            self.phase = ResultsPhase::Error(MISSING_LOCATION_MESSAGE.to_string());
            return None;
        };

        let query = HospitalQuery {
            location: request.location.clone(),
            health_issue: request.health_issue.clone(),
            page: self.pages.page,
            per_page: self.pages.per_page,
        };
        self.phase = ResultsPhase::Loading;
        Some(FetchPlan {
            ticket: self.gate.issue(),
            query,
        })
    }

    /// Apply a fetch outcome. Outcomes for superseded tickets are ignored.
    ///
    /// Returns the transient notification to show, if any.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<HospitalSearchResponse, ApiError>,
    ) -> Option<Notification> {
        if !self.gate.is_current(ticket) {
            debug!(?ticket, "dropping superseded hospital search response");
            return None;
        }

        match result {
            Ok(response) => {
                info!(
                    total = response.total,
                    page = self.pages.page,
                    total_pages = response.total_pages,
                    "hospital search loaded"
                );
                self.pages.total_pages = response.total_pages.max(1);
                self.hospitals = response.hospitals;
                self.availability = response.availability;
                self.total = response.total;
                self.data_version += 1;
                self.phase = ResultsPhase::Success;
                None
            }
            Err(e) => {
                warn!(error = %e, "hospital search failed");
                let message = e.to_string();
                let message = if message.trim().is_empty() {
                    HOSPITALS_FALLBACK_MESSAGE.to_string()
                } else {
                    message
                };
                self.phase = ResultsPhase::Error(message);
                Some(Notification::error("Error", FETCH_FAILED_NOTICE))
            }
        }
    }

    /// Run the fetch for the current query and page to completion.
    pub async fn load<A: HospitalSearchApi>(&mut self, api: &A) -> Option<Notification> {
        let plan = self.begin_fetch()?;
        let result = api.search_hospitals(&plan.query).await;
        self.complete(plan.ticket, result)
    }

    /// The filtered, sorted page. Recomputed only when the data or the filters change.
    pub fn filtered(&mut self) -> &GroupedHospitals {
        let stale = self.derived.as_ref().is_none_or(|d| {
            d.data_version != self.data_version || d.filters != self.filters
        });
        if stale {
            self.derived = Some(Derived {
                data_version: self.data_version,
                filters: self.filters,
                output: apply_filters(&self.hospitals, &self.filters),
            });
        }
        match &self.derived {
            Some(derived) => &derived.output,
            None => &self.hospitals,
        }
    }
}
