use std::sync::Arc;

use askama::Template;
use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use finder_common::autocomplete::{ConditionAutocomplete, LocationAutocomplete};
use finder_common::booking::{parse_form_date, BookingRequest, BookingService};
use finder_common::geolocation::{resolve_current_location, ReportedPosition};
use finder_common::intake::SearchIntake;
use finder_common::metrics::HospitalMetrics;
use finder_common::model::{HospitalSearchResponse, Location, LocationField, LocationRelevance};
use finder_common::notify::Notification;
use finder_common::presentation::{results_page, SectionPagers};
use finder_common::results::{ResultsPhase, ResultsView, MISSING_LOCATION_MESSAGE};
use finder_common::search_api::{ApiError, HospitalQuery, HospitalSearchApi};

use crate::cache::PageCache;
use crate::error::AppError;
use crate::pages::{BookingTemplate, HomeTemplate, ResultsTemplate, SECTION_ORDER};
use crate::query::{ResultsQuery, ResultsState};

pub struct AppState<A> {
    pub api: Arc<A>,
    pub booking: Arc<dyn BookingService>,
    pub per_page: u32,
    pub fallback_location: Arc<str>,
    pub pages: PageCache,
}

impl<A> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            booking: Arc::clone(&self.booking),
            per_page: self.per_page,
            fallback_location: Arc::clone(&self.fallback_location),
            pages: self.pages.clone(),
        }
    }
}

pub fn router<A>(state: AppState<A>) -> Router
where
    A: HospitalSearchApi + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(home))
        .route("/search", post(submit_search))
        .route("/results", get(results::<A>))
        .route("/api/locations", get(locations::<A>))
        .route("/api/conditions", get(conditions::<A>))
        .route("/appointments", post(book_appointment::<A>))
        .route("/api/geolocation", get(geolocation::<A>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn render(template: &impl Template, status: StatusCode) -> Result<Response, AppError> {
    Ok((status, Html(template.render()?)).into_response())
}

async fn health() -> &'static str {
    "ok"
}

async fn home() -> Result<Response, AppError> {
    render(&HomeTemplate::new(), StatusCode::OK)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchForm {
    #[serde(default)]
    location: String,
    #[serde(default)]
    health_issue: String,
    #[serde(default)]
    condition: String,
}

async fn submit_search(Form(form): Form<SearchForm>) -> Result<Response, AppError> {
    let intake = SearchIntake {
        location: form.location,
        health_issue: form.health_issue,
        selected_condition: Some(form.condition).filter(|c| !c.trim().is_empty()),
    };

    match intake.submit() {
        Ok(request) => {
            let href = ResultsState::for_request(&request).href();
            info!(location = %request.location, "search submitted");
            Ok(Redirect::to(&href).into_response())
        }
        Err(e) => {
            let template = HomeTemplate {
                notification: Some(e.notification()),
                location: intake.location,
                condition: intake.selected_condition.unwrap_or_default(),
                health_issue: intake.health_issue,
                ..HomeTemplate::new()
            };
            render(&template, StatusCode::UNPROCESSABLE_ENTITY)
        }
    }
}

async fn results<A: HospitalSearchApi>(
    State(state): State<AppState<A>>,
    Query(query): Query<ResultsQuery>,
) -> Result<Response, AppError> {
    let url_state = ResultsState::from(query);

    let mut view = ResultsView::new(url_state.request(), state.per_page);
    view.start_at_page(url_state.page);
    view.set_filters(url_state.filters);
    let notification = match view.begin_fetch() {
        Some(plan) => {
            let result = fetch_page(&state, &plan.query).await;
            view.complete(plan.ticket, result)
        }
        None => None,
    };

    if let ResultsPhase::Error(message) = view.phase() {
        let search_again = message == MISSING_LOCATION_MESSAGE;
        let template = ResultsTemplate::failed(&url_state, message.clone(), search_again, notification);
        let status = if search_again {
            StatusCode::OK
        } else {
            StatusCode::BAD_GATEWAY
        };
        return render(&template, status);
    }

    let pages = *view.pages();
    let chips = view.filters().active_chips();
    let filtered = view.filtered().clone();

    // Requested section pages past the end of their list start over.
    let mut pagers = SectionPagers::default();
    for relevance in SECTION_ORDER {
        let len = match relevance {
            LocationRelevance::City => filtered.city_hospitals.len(),
            LocationRelevance::State => filtered.state_hospitals.len(),
            LocationRelevance::Other => filtered.other_hospitals.len(),
        };
        let pager = pagers.get_mut(relevance);
        let requested = url_state.section_page(relevance);
        let page = if requested <= pager.total_pages(len) { requested } else { 1 };
        pager.set_page(page, len);
    }

    let page = results_page(
        &url_state.location,
        &url_state.health_issue,
        &filtered,
        pages,
        chips,
        &mut pagers,
    );
    let metrics = HospitalMetrics::from_hospitals(filtered.iter());
    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    render(
        &ResultsTemplate::loaded(&url_state, page, metrics, today),
        StatusCode::OK,
    )
}

/// Filter, sort and section-page links only change how an already fetched page is
/// shown, so they are served from the cache.
async fn fetch_page<A: HospitalSearchApi>(
    state: &AppState<A>,
    query: &HospitalQuery,
) -> Result<HospitalSearchResponse, ApiError> {
    if let Some(hit) = state.pages.get(query).await {
        return Ok(hit);
    }
    let response = state.api.search_hospitals(query).await?;
    state.pages.insert(query.clone(), response.clone()).await;
    Ok(response)
}

#[derive(Debug, Deserialize)]
struct SuggestionQuery {
    #[serde(default)]
    query: String,
    field: Option<String>,
}

#[derive(Debug, Serialize)]
struct Suggestions<T> {
    results: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<Notification>,
}

async fn locations<A: HospitalSearchApi>(
    State(state): State<AppState<A>>,
    Query(q): Query<SuggestionQuery>,
) -> Result<Json<Suggestions<Location>>, (StatusCode, String)> {
    let field: LocationField = q
        .field
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|e: String| (StatusCode::BAD_REQUEST, e))?;

    let picker = LocationAutocomplete::locations();
    let notification = picker.search_locations(state.api.as_ref(), field, &q.query).await;
    Ok(Json(Suggestions {
        results: picker.snapshot().await.results,
        notification,
    }))
}

async fn conditions<A: HospitalSearchApi>(
    State(state): State<AppState<A>>,
    Query(q): Query<SuggestionQuery>,
) -> Json<Suggestions<String>> {
    let picker = ConditionAutocomplete::conditions();
    let notification = picker.search_conditions(state.api.as_ref(), &q.query).await;
    Json(Suggestions {
        results: picker.snapshot().await.results,
        notification,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppointmentForm {
    hospital_name: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    time_slot: String,
    back: Option<String>,
}

async fn book_appointment<A: HospitalSearchApi>(
    State(state): State<AppState<A>>,
    Form(form): Form<AppointmentForm>,
) -> Result<Response, AppError> {
    // Only follow links back into this site.
    let back_href = form
        .back
        .filter(|b| b.starts_with('/') && !b.starts_with("//"))
        .unwrap_or_else(|| "/".to_string());

    let outcome = parse_form_date(&form.date).and_then(|date| {
        state.booking.book(&BookingRequest {
            hospital_name: form.hospital_name.clone(),
            date,
            time_slot: Some(form.time_slot.clone()),
        })
    });

    let (template, status) = match outcome {
        Ok(confirmation) => (
            BookingTemplate {
                notification: Some(confirmation.notification()),
                hospital_name: form.hospital_name,
                confirmation: Some(confirmation.message),
                back_href,
            },
            StatusCode::OK,
        ),
        Err(e) => (
            BookingTemplate {
                notification: Some(e.notification()),
                hospital_name: form.hospital_name,
                confirmation: None,
                back_href,
            },
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
    };
    render(&template, status)
}

#[derive(Debug, Serialize)]
struct GeolocationBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn geolocation<A: HospitalSearchApi>(
    State(state): State<AppState<A>>,
    Query(position): Query<ReportedPosition>,
) -> (StatusCode, Json<GeolocationBody>) {
    match resolve_current_location(&position, &state.fallback_location).await {
        Ok(location) => (
            StatusCode::OK,
            Json(GeolocationBody {
                location: Some(location),
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(GeolocationBody {
                location: None,
                error: Some(e.to_string()),
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono::{Datelike, Duration, Weekday};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use finder_common::booking::MockBookingService;
    use finder_common::model::{Availability, GroupedHospitals, Hospital};

    use super::*;

    #[derive(Default)]
    struct FakeApi {
        calls: AtomicUsize,
        hospitals: GroupedHospitals,
        total_pages: u32,
        fail: bool,
    }

    impl HospitalSearchApi for FakeApi {
        async fn search_hospitals(
            &self,
            query: &HospitalQuery,
        ) -> Result<HospitalSearchResponse, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Upstream {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Failed to fetch hospitals".to_string(),
                });
            }
            Ok(HospitalSearchResponse {
                hospitals: self.hospitals.clone(),
                availability: Availability::of(&self.hospitals),
                total: self.hospitals.total(),
                page: query.page,
                per_page: query.per_page,
                total_pages: self.total_pages.max(1),
            })
        }

        async fn search_conditions(&self, query: &str) -> Result<Vec<String>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![format!("{query} failure")])
        }

        async fn search_locations(
            &self,
            query: &str,
            _field: LocationField,
        ) -> Result<Vec<Location>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Upstream {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Failed to fetch locations".to_string(),
                });
            }
            Ok(vec![Location::from_display(format!("{query}, AL"))])
        }
    }

    fn city_hospital(name: &str) -> Hospital {
        Hospital {
            id: name.to_lowercase(),
            name: name.to_string(),
            address: "4370 W Main St".to_string(),
            city: "Dothan".to_string(),
            state: "AL".to_string(),
            zip_code: "36305".to_string(),
            county: Some("Houston".to_string()),
            score: 82.0,
            has_data: true,
            performance_level: "Good".to_string(),
            description: "Acute care hospital".to_string(),
            location_relevance: Some(LocationRelevance::City),
            ratings: None,
            statistics: None,
        }
    }

    fn app_with(api: Arc<FakeApi>) -> Router {
        router(AppState {
            api,
            booking: Arc::new(MockBookingService::new()),
            per_page: 10,
            fallback_location: Arc::from("New York, NY"),
            pages: PageCache::default(),
        })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = send(app_with(Arc::default()), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn valid_search_redirects_to_results() {
        let response = app_with(Arc::default())
            .oneshot(post_form(
                "/search",
                "location=Dothan%2C+AL&condition=Cardiology&healthIssue=chest+pain",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/results?location=Dothan%2C%20AL&healthIssue=Cardiology%20-%20chest%20pain"
        );
    }

    #[tokio::test]
    async fn incomplete_search_rerenders_form_with_notification() {
        let api = Arc::new(FakeApi::default());
        let (status, body) = send(
            app_with(Arc::clone(&api)),
            post_form("/search", "location=Dothan%2C+AL&healthIssue=+"),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("Required Fields Missing"));
        assert!(body.contains("Please provide both location and health condition details"));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn results_without_location_never_fetch() {
        let api = Arc::new(FakeApi::default());
        let (status, body) = send(app_with(Arc::clone(&api)), get("/results?location=")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(MISSING_LOCATION_MESSAGE));
        assert!(body.contains("Please search again"));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn single_city_hospital_renders_one_section() {
        let api = Arc::new(FakeApi {
            hospitals: GroupedHospitals {
                city_hospitals: vec![city_hospital("Flowers Hospital")],
                ..GroupedHospitals::default()
            },
            ..FakeApi::default()
        });
        let (status, body) = send(
            app_with(api),
            get("/results?location=Dothan%2C%20AL&healthIssue=heart%20attack"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Hospitals in Dothan, AL"));
        assert!(body.contains("Flowers Hospital"));
        assert!(body.contains("1 hospital found"));
        assert!(!body.contains("Hospitals in Your State"));
        assert!(!body.contains("Other Relevant Hospitals"));
        assert!(!body.contains("class=\"pager\""));
    }

    #[tokio::test]
    async fn heading_omits_empty_health_issue() {
        let api = Arc::new(FakeApi {
            hospitals: GroupedHospitals {
                city_hospitals: vec![city_hospital("Flowers Hospital")],
                ..GroupedHospitals::default()
            },
            ..FakeApi::default()
        });
        let (_, body) = send(app_with(Arc::clone(&api)), get("/results?location=Dothan")).await;
        assert!(body.contains("Showing results for Dothan</p>"));

        let (_, body) = send(app_with(api), get("/results?location=Dothan&healthIssue=flu")).await;
        assert!(body.contains("Showing results for Dothan - flu</p>"));
    }

    #[tokio::test]
    async fn multi_page_results_link_to_next_page() {
        let api = Arc::new(FakeApi {
            hospitals: GroupedHospitals {
                city_hospitals: vec![city_hospital("Flowers Hospital")],
                ..GroupedHospitals::default()
            },
            total_pages: 3,
            ..FakeApi::default()
        });
        let (_, body) = send(
            app_with(api),
            get("/results?location=Dothan&healthIssue=flu&page=2&sortBy=name"),
        )
        .await;
        assert!(body.contains("Page 2 of 3"));
        assert!(body.contains("?location=Dothan&amp;healthIssue=flu&amp;page=3&amp;sortBy=name\""));
        assert!(body.contains("Sorted by: Hospital Name"));
    }

    #[tokio::test]
    async fn backend_failure_shows_error_and_notification() {
        let api = Arc::new(FakeApi {
            fail: true,
            ..FakeApi::default()
        });
        let (status, body) =
            send(app_with(api), get("/results?location=Dothan&healthIssue=flu")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("Failed to fetch hospitals. Please try again."));
    }

    #[tokio::test]
    async fn filter_and_reset_links_reuse_the_fetched_page() {
        let api = Arc::new(FakeApi {
            hospitals: GroupedHospitals {
                city_hospitals: vec![city_hospital("Flowers Hospital")],
                ..GroupedHospitals::default()
            },
            total_pages: 2,
            ..FakeApi::default()
        });
        let app = app_with(Arc::clone(&api));

        for uri in [
            "/results?location=Dothan&healthIssue=flu",
            "/results?location=Dothan&healthIssue=flu&scope=city",
            "/results?location=Dothan&healthIssue=flu&sortBy=name&cityPage=2",
            "/results?location=Dothan&healthIssue=flu",
        ] {
            let (status, body) = send(app.clone(), get(uri)).await;
            assert_eq!(status, StatusCode::OK);
            assert!(body.contains("Flowers Hospital"));
        }
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);

        send(app, get("/results?location=Dothan&healthIssue=flu&page=2")).await;
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_fetch_is_retried_on_next_request() {
        let api = Arc::new(FakeApi {
            fail: true,
            ..FakeApi::default()
        });
        let app = app_with(Arc::clone(&api));
        for _ in 0..2 {
            let (status, _) = send(app.clone(), get("/results?location=Dothan&healthIssue=flu")).await;
            assert_eq!(status, StatusCode::BAD_GATEWAY);
        }
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn short_location_query_skips_backend() {
        let api = Arc::new(FakeApi::default());
        let (status, body) =
            send(app_with(Arc::clone(&api)), get("/api/locations?query=D")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"results":[]}"#);
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);

        let (status, _) =
            send(app_with(Arc::clone(&api)), get("/api/locations?query=Do&field=Town")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn suggestions_come_back_as_json() {
        let api = Arc::new(FakeApi::default());
        let (_, body) = send(app_with(Arc::clone(&api)), get("/api/conditions?query=heart")).await;
        assert_eq!(body, r#"{"results":["heart failure"]}"#);

        let (_, body) =
            send(app_with(api), get("/api/locations?query=Dothan&field=City")).await;
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["results"][0]["displayString"], "Dothan, AL");
    }

    #[tokio::test]
    async fn failed_location_lookup_clears_results_and_notifies() {
        let api = Arc::new(FakeApi {
            fail: true,
            ..FakeApi::default()
        });
        let (status, body) = send(app_with(api), get("/api/locations?query=Dothan")).await;
        assert_eq!(status, StatusCode::OK);
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["results"], serde_json::json!([]));
        assert_eq!(parsed["notification"]["title"], "Error");
        assert_eq!(parsed["notification"]["variant"], "destructive");

        let (_, home) = send(app_with(Arc::default()), get("/")).await;
        assert!(home.contains("body.notification"));
        assert!(home.contains("Failed to fetch locations"));
        assert!(home.contains("Failed to fetch health conditions"));
    }

    #[tokio::test]
    async fn booking_confirms_next_weekday_and_rejects_weekends() {
        let mut day = Local::now().date_naive() + Duration::days(7);
        while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            day += Duration::days(1);
        }
        let form = format!(
            "hospitalName=Flowers+Hospital&date={}&timeSlot=10%3A00+AM&back=%2Fresults%3Flocation%3DDothan",
            day.format("%Y-%m-%d")
        );
        let (status, body) = send(app_with(Arc::default()), post_form("/appointments", &form)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Your appointment at Flowers Hospital is scheduled for"));
        assert!(body.contains("results?location=Dothan\""));

        let mut saturday = day;
        while saturday.weekday() != Weekday::Sat {
            saturday += Duration::days(1);
        }
        let form = format!(
            "hospitalName=Flowers+Hospital&date={}&timeSlot=10%3A00+AM&back=https%3A%2F%2Fevil.example",
            saturday.format("%Y-%m-%d")
        );
        let (status, body) = send(app_with(Arc::default()), post_form("/appointments", &form)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("Appointments are only available on weekdays"));
        assert!(!body.contains("evil.example"));
    }

    #[tokio::test]
    async fn geolocation_resolves_or_reports() {
        let (status, body) =
            send(app_with(Arc::default()), get("/api/geolocation?lat=31.2&lon=-85.4")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"location":"New York, NY"}"#);

        let (status, body) =
            send(app_with(Arc::default()), get("/api/geolocation?error=timeout")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, r#"{"error":"Location request timed out"}"#);
    }
}
