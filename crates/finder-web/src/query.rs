//! Results-page state carried in the URL, so every view is bookmarkable and survives
//! a reload.

use serde::Deserialize;

use finder_common::filter::{
    FilterState, LocationScope, PerformanceScope, SortKey, DEFAULT_MAX_DISTANCE,
};
use finder_common::intake::SearchRequest;
use finder_common::model::LocationRelevance;

/// Raw query string of `GET /results`. Unknown enum values fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsQuery {
    pub location: Option<String>,
    pub health_issue: Option<String>,
    pub page: Option<u32>,
    pub sort_by: Option<String>,
    pub scope: Option<String>,
    pub performance: Option<String>,
    pub only_with_data: Option<bool>,
    pub max_distance: Option<u32>,
    pub city_page: Option<usize>,
    pub state_page: Option<usize>,
    pub other_page: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsState {
    pub location: String,
    pub health_issue: String,
    pub page: u32,
    pub filters: FilterState,
    city_page: usize,
    state_page: usize,
    other_page: usize,
}

impl From<ResultsQuery> for ResultsState {
    fn from(q: ResultsQuery) -> Self {
        let defaults = FilterState::default();
        let filters = FilterState {
            location: parse_enum(q.scope.as_deref(), &LocationScope::ALL, |s| s.as_str())
                .unwrap_or(defaults.location),
            performance: parse_enum(q.performance.as_deref(), &PerformanceScope::ALL, |s| {
                s.as_str()
            })
            .unwrap_or(defaults.performance),
            sort_by: parse_enum(q.sort_by.as_deref(), &SortKey::ALL, |s| s.as_str())
                .unwrap_or(defaults.sort_by),
            only_with_data: q.only_with_data.unwrap_or(false),
            max_distance: q
                .max_distance
                .unwrap_or(DEFAULT_MAX_DISTANCE)
                .min(DEFAULT_MAX_DISTANCE),
        };
        Self {
            location: q.location.unwrap_or_default().trim().to_string(),
            health_issue: q.health_issue.unwrap_or_default().trim().to_string(),
            page: q.page.unwrap_or(1).max(1),
            filters,
            city_page: q.city_page.unwrap_or(1).max(1),
            state_page: q.state_page.unwrap_or(1).max(1),
            other_page: q.other_page.unwrap_or(1).max(1),
        }
    }
}

fn parse_enum<T: Copy>(raw: Option<&str>, all: &[T], name: impl Fn(T) -> &'static str) -> Option<T> {
    let raw = raw?.trim();
    all.iter().copied().find(|v| name(*v).eq_ignore_ascii_case(raw))
}

impl ResultsState {
    pub fn for_request(request: &SearchRequest) -> Self {
        Self::from(ResultsQuery {
            location: Some(request.location.clone()),
            health_issue: Some(request.health_issue.clone()),
            ..ResultsQuery::default()
        })
    }

    /// `None` when there is no location to search for.
    pub fn request(&self) -> Option<SearchRequest> {
        (!self.location.is_empty()).then(|| SearchRequest {
            location: self.location.clone(),
            health_issue: self.health_issue.clone(),
        })
    }

    pub fn section_page(&self, relevance: LocationRelevance) -> usize {
        match relevance {
            LocationRelevance::City => self.city_page,
            LocationRelevance::State => self.state_page,
            LocationRelevance::Other => self.other_page,
        }
    }

    /// Another server page. Section pages start over.
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.with_section_pages_reset()
        }
    }

    /// Different filters change every section's list, so section pages start over.
    pub fn with_filters(&self, filters: FilterState) -> Self {
        Self {
            filters,
            ..self.with_section_pages_reset()
        }
    }

    pub fn with_section_page(&self, relevance: LocationRelevance, page: usize) -> Self {
        let mut next = self.clone();
        let page = page.max(1);
        match relevance {
            LocationRelevance::City => next.city_page = page,
            LocationRelevance::State => next.state_page = page,
            LocationRelevance::Other => next.other_page = page,
        }
        next
    }

    fn with_section_pages_reset(&self) -> Self {
        Self {
            city_page: 1,
            state_page: 1,
            other_page: 1,
            ..self.clone()
        }
    }

    /// `/results?...`, leaving out values that are at their defaults.
    pub fn href(&self) -> String {
        let defaults = FilterState::default();
        let mut params: Vec<(&str, String)> = vec![
            ("location", self.location.clone()),
            ("healthIssue", self.health_issue.clone()),
        ];
        if self.page != 1 {
            params.push(("page", self.page.to_string()));
        }
        if self.filters.sort_by != defaults.sort_by {
            params.push(("sortBy", self.filters.sort_by.as_str().to_string()));
        }
        if self.filters.location != defaults.location {
            params.push(("scope", self.filters.location.as_str().to_string()));
        }
        if self.filters.performance != defaults.performance {
            params.push(("performance", self.filters.performance.as_str().to_string()));
        }
        if self.filters.only_with_data {
            params.push(("onlyWithData", "true".to_string()));
        }
        if self.filters.max_distance != defaults.max_distance {
            params.push(("maxDistance", self.filters.max_distance.to_string()));
        }
        for (key, page) in [
            ("cityPage", self.city_page),
            ("statePage", self.state_page),
            ("otherPage", self.other_page),
        ] {
            if page != 1 {
                params.push((key, page.to_string()));
            }
        }

        let query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect();
        format!("/results?{}", query.join("&"))
    }
}
