//! Filter/sort pipeline over one fetched page of grouped results.
//!
//! Everything here is a pure function of `(GroupedHospitals, FilterState)`: inputs are
//! never mutated and the output keeps the three-way city/state/other shape.

use std::cmp::Ordering;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{GroupedHospitals, Hospital, LocationRelevance};

pub const DEFAULT_MAX_DISTANCE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LocationScope {
    #[default]
    All,
    City,
    State,
}

impl LocationScope {
    pub const ALL: [LocationScope; 3] = [LocationScope::All, LocationScope::City, LocationScope::State];

    pub fn as_str(self) -> &'static str {
        match self {
            LocationScope::All => "all",
            LocationScope::City => "city",
            LocationScope::State => "state",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LocationScope::All => "All Locations",
            LocationScope::City => "City Only",
            LocationScope::State => "State Only",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceScope {
    #[default]
    All,
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl PerformanceScope {
    pub const ALL: [PerformanceScope; 5] = [
        PerformanceScope::All,
        PerformanceScope::Excellent,
        PerformanceScope::Good,
        PerformanceScope::Fair,
        PerformanceScope::NeedsImprovement,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PerformanceScope::All => "all",
            PerformanceScope::Excellent => "excellent",
            PerformanceScope::Good => "good",
            PerformanceScope::Fair => "fair",
            PerformanceScope::NeedsImprovement => "needs_improvement",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PerformanceScope::All => "All Performance Levels",
            PerformanceScope::Excellent => "Excellent",
            PerformanceScope::Good => "Good",
            PerformanceScope::Fair => "Fair",
            PerformanceScope::NeedsImprovement => "Needs Improvement",
        }
    }

    /// Case-insensitive match against the backend's free-form performance level.
    pub fn matches(self, performance_level: &str) -> bool {
        match self {
            PerformanceScope::All => true,
            scope => performance_level
                .trim()
                .eq_ignore_ascii_case(&scope.as_str().replace('_', " ")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Score,
    Name,
    Rating,
    Distance,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [SortKey::Score, SortKey::Name, SortKey::Rating, SortKey::Distance];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Score => "score",
            SortKey::Name => "name",
            SortKey::Rating => "rating",
            SortKey::Distance => "distance",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Score => "Performance Score",
            SortKey::Name => "Hospital Name",
            SortKey::Rating => "Best Rating",
            SortKey::Distance => "Nearest First",
        }
    }
}

/// View preferences for the results page. Lives only as long as the view does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub location: LocationScope,
    pub performance: PerformanceScope,
    pub sort_by: SortKey,
    pub only_with_data: bool,
    /// Miles, 0..=100. There is no distance on the wire, so this never removes a hospital.
    pub max_distance: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            location: LocationScope::All,
            performance: PerformanceScope::All,
            sort_by: SortKey::Score,
            only_with_data: false,
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum FilterKey {
    Location,
    Performance,
    SortBy,
    OnlyWithData,
    MaxDistance,
}

/// A removable badge describing one non-default filter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FilterChip {
    pub key: FilterKey,
    pub label: String,
}

impl FilterState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn reset_key(&mut self, key: FilterKey) {
        let defaults = Self::default();
        match key {
            FilterKey::Location => self.location = defaults.location,
            FilterKey::Performance => self.performance = defaults.performance,
            FilterKey::SortBy => self.sort_by = defaults.sort_by,
            FilterKey::OnlyWithData => self.only_with_data = defaults.only_with_data,
            FilterKey::MaxDistance => self.max_distance = defaults.max_distance,
        }
    }

    pub fn set_max_distance(&mut self, miles: u32) {
        self.max_distance = miles.min(DEFAULT_MAX_DISTANCE);
    }

    pub fn active_chips(&self) -> Vec<FilterChip> {
        let defaults = Self::default();
        let mut chips = Vec::new();
        if self.location != defaults.location {
            chips.push(FilterChip {
                key: FilterKey::Location,
                label: self.location.label().to_string(),
            });
        }
        if self.performance != defaults.performance {
            chips.push(FilterChip {
                key: FilterKey::Performance,
                label: self.performance.label().to_string(),
            });
        }
        if self.sort_by != defaults.sort_by {
            chips.push(FilterChip {
                key: FilterKey::SortBy,
                label: format!("Sorted by: {}", self.sort_by.label()),
            });
        }
        if self.only_with_data {
            chips.push(FilterChip {
                key: FilterKey::OnlyWithData,
                label: "With available data only".to_string(),
            });
        }
        if self.max_distance != defaults.max_distance {
            chips.push(FilterChip {
                key: FilterKey::MaxDistance,
                label: format!("Within {} miles", self.max_distance),
            });
        }
        chips
    }
}

/// Derive the displayable result set from the fetched page and the current filters.
pub fn apply_filters(hospitals: &GroupedHospitals, filters: &FilterState) -> GroupedHospitals {
    GroupedHospitals {
        city_hospitals: filter_and_sort(&hospitals.city_hospitals, LocationRelevance::City, filters),
        state_hospitals: filter_and_sort(
            &hospitals.state_hospitals,
            LocationRelevance::State,
            filters,
        ),
        other_hospitals: filter_and_sort(
            &hospitals.other_hospitals,
            LocationRelevance::Other,
            filters,
        ),
    }
}

fn filter_and_sort(
    bucket: &[Hospital],
    relevance: LocationRelevance,
    filters: &FilterState,
) -> Vec<Hospital> {
    let mut kept: Vec<Hospital> = bucket
        .iter()
        .filter(|h| in_location_scope(h, relevance, filters.location))
        .filter(|h| filters.performance.matches(&h.performance_level))
        .filter(|h| !filters.only_with_data || h.has_data)
        .cloned()
        .collect();
    kept.sort_by(|a, b| compare(a, b, filters.sort_by));
    kept
}

// Buckets arrive pre-classified, so the relevance check always holds inside its own
// bucket. `State` scope still keeps the city bucket.
fn in_location_scope(hospital: &Hospital, bucket: LocationRelevance, scope: LocationScope) -> bool {
    if scope == LocationScope::All {
        return true;
    }
    match bucket {
        LocationRelevance::City => hospital.is_relevant_to(LocationRelevance::City),
        LocationRelevance::State => {
            scope != LocationScope::City && hospital.is_relevant_to(LocationRelevance::State)
        }
        LocationRelevance::Other => {
            scope != LocationScope::City && hospital.is_relevant_to(LocationRelevance::Other)
        }
    }
}

fn compare(a: &Hospital, b: &Hospital, sort_by: SortKey) -> Ordering {
    match sort_by {
        SortKey::Score => b
            .has_data
            .cmp(&a.has_data)
            .then_with(|| b.score.total_cmp(&a.score)),
        SortKey::Name => locale_cmp(&a.name, &b.name),
        SortKey::Rating => match (a.overall_rating(), b.overall_rating()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        // No distance on the wire; keep the server's order.
        SortKey::Distance => Ordering::Equal,
    }
}

/// Case-insensitive ordering with lowercase ahead of uppercase on otherwise equal names.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| b.cmp(a))
}
