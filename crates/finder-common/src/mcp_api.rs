use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::booking::BookingConfirmation;
use crate::filter::{FilterChip, FilterState, LocationScope, PerformanceScope, SortKey};
use crate::metrics::HospitalMetrics;
use crate::model::{Availability, GroupedHospitals, Location, LocationField};
use crate::notify::Notification;
use crate::pagination::PageState;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchHospitalsParams {
    /// City and state to search around, e.g. "Dothan, AL".
    pub location: String,
    /// Condition or symptoms, e.g. "Heart attack - chest pain".
    pub health_issue: String,
    /// 1-indexed server page (default: 1).
    pub page: Option<u32>,
    /// Hospitals per server page (default: configured page size, max: 100).
    pub per_page: Option<u32>,
    /// Restrict to "all", "city" or "state" (default: all).
    pub location_scope: Option<LocationScope>,
    /// Sort within each group: "score", "name", "rating" or "distance" (default: score).
    pub sort_by: Option<SortKey>,
    /// Performance level filter (default: all).
    pub performance: Option<PerformanceScope>,
    /// Drop hospitals without quality data (default: false).
    pub only_with_data: Option<bool>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchHospitalsResponse {
    pub hospitals: GroupedHospitals,
    pub availability: Availability,
    /// Total hospitals matching the query across all server pages.
    pub total: usize,
    pub pagination: PageState,
    pub filters: FilterState,
    pub active_filters: Vec<FilterChip>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchConditionsParams {
    /// Partial condition name.
    pub query: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchConditionsResponse {
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchLocationsParams {
    /// Partial place name, at least 2 characters.
    pub query: String,
    /// Column to match: "City", "State" or "County" (default: City).
    pub field: Option<LocationField>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchLocationsResponse {
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BookAppointmentParams {
    pub hospital_name: String,
    /// Appointment date as YYYY-MM-DD. Weekdays from today onwards.
    pub date: String,
    /// One of "09:00 AM", "10:00 AM", "11:00 AM", "02:00 PM", "03:00 PM", "04:00 PM".
    pub time_slot: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct BookAppointmentResponse {
    pub confirmation: BookingConfirmation,
    pub notification: Notification,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct HospitalMetricsParams {
    pub location: String,
    pub health_issue: String,
    /// 1-indexed server page (default: 1).
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct HospitalMetricsResponse {
    pub metrics: HospitalMetrics,
}
