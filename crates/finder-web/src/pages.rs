// HTML views. Handlers build these from already-derived view models.

use askama::Template;

use finder_common::autocomplete::LOCATION_MIN_QUERY_LEN;
use finder_common::booking::TIME_SLOTS;
use finder_common::filter::{FilterKey, FilterState, LocationScope, PerformanceScope, SortKey};
use finder_common::metrics::HospitalMetrics;
use finder_common::model::LocationRelevance;
use finder_common::notify::Notification;
use finder_common::presentation::{BannerTone, HospitalCard, ResultsPage};
use finder_common::search_api::{CONDITIONS_FALLBACK_MESSAGE, LOCATIONS_FALLBACK_MESSAGE};

use crate::query::ResultsState;

const DISTANCE_STEPS: [u32; 4] = [10, 25, 50, 100];

#[derive(Template, Default)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub notification: Option<Notification>,
    pub location: String,
    pub condition: String,
    pub health_issue: String,
    pub location_min_len: usize,
    pub location_fallback: &'static str,
    pub condition_fallback: &'static str,
}

impl HomeTemplate {
    pub fn new() -> Self {
        Self {
            location_min_len: LOCATION_MIN_QUERY_LEN,
            location_fallback: LOCATIONS_FALLBACK_MESSAGE,
            condition_fallback: CONDITIONS_FALLBACK_MESSAGE,
            ..Self::default()
        }
    }
}

pub struct Link {
    pub label: String,
    pub href: String,
    pub active: bool,
}

pub struct BannerBlock {
    pub class: &'static str,
    pub message: String,
}

pub struct SectionBlock {
    pub heading: String,
    pub subtitle: String,
    pub count_label: String,
    pub cards: Vec<HospitalCard>,
    pub page: usize,
    pub total_pages: usize,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
}

pub struct PagerBlock {
    pub page: u32,
    pub total_pages: u32,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
}

#[derive(Template)]
#[template(path = "results.html")]
pub struct ResultsTemplate {
    pub notification: Option<Notification>,
    pub location: String,
    pub health_issue: String,
    pub error: Option<String>,
    pub search_again: bool,
    pub banners: Vec<BannerBlock>,
    pub sections: Vec<SectionBlock>,
    pub empty_message: Option<String>,
    pub pager: Option<PagerBlock>,
    pub scope_links: Vec<Link>,
    pub sort_links: Vec<Link>,
    pub performance_links: Vec<Link>,
    pub distance_links: Vec<Link>,
    pub data_link: Link,
    pub chips: Vec<Link>,
    pub reset_href: Option<String>,
    pub metrics: Option<HospitalMetrics>,
    pub time_slots: Vec<&'static str>,
    pub back_href: String,
    pub min_date: String,
}

impl ResultsTemplate {
    /// The page shown when there is nothing to render but an error.
    pub fn failed(
        state: &ResultsState,
        message: String,
        search_again: bool,
        notification: Option<Notification>,
    ) -> Self {
        let mut template = Self::empty(state);
        template.error = Some(message);
        template.search_again = search_again;
        template.notification = notification;
        template
    }

    pub fn loaded(
        state: &ResultsState,
        page: ResultsPage,
        metrics: HospitalMetrics,
        min_date: String,
    ) -> Self {
        let mut template = Self::empty(state);

        template.banners = page
            .banners
            .into_iter()
            .map(|b| BannerBlock {
                class: match b.tone {
                    BannerTone::Warning => "warning",
                    BannerTone::Info => "info",
                },
                message: b.message,
            })
            .collect();

        template.sections = page
            .sections
            .into_iter()
            .map(|s| {
                let relevance = s.relevance;
                let link = |p: usize| state.with_section_page(relevance, p).href();
                SectionBlock {
                    previous_href: (s.page > 1).then(|| link(s.page - 1)),
                    next_href: (s.page < s.total_pages).then(|| link(s.page + 1)),
                    heading: s.heading,
                    subtitle: s.subtitle,
                    count_label: s.count_label,
                    cards: s.cards,
                    page: s.page,
                    total_pages: s.total_pages,
                }
            })
            .collect();

        template.pager = page.pagination.map(|p| PagerBlock {
            page: p.page,
            total_pages: p.total_pages,
            previous_href: p.has_previous().then(|| state.with_page(p.previous_page()).href()),
            next_href: p.has_next().then(|| state.with_page(p.next_page()).href()),
        });

        template.chips = page
            .chips
            .into_iter()
            .map(|chip| {
                let mut filters = state.filters;
                filters.reset_key(chip.key);
                Link {
                    label: chip.label,
                    href: state.with_filters(filters).href(),
                    active: true,
                }
            })
            .collect();
        if !template.chips.is_empty() {
            template.reset_href = Some(state.with_filters(FilterState::default()).href());
        }

        template.empty_message = page.empty_message;
        template.metrics = Some(metrics);
        template.min_date = min_date;
        template
    }

    fn empty(state: &ResultsState) -> Self {
        let filters = state.filters;
        let filter_link = |label: &str, next: FilterState| Link {
            label: label.to_string(),
            href: state.with_filters(next).href(),
            active: next == filters,
        };

        let mut without_data_filter = filters;
        without_data_filter.reset_key(FilterKey::OnlyWithData);
        let data_link = if filters.only_with_data {
            Link {
                label: "Show all hospitals".to_string(),
                href: state.with_filters(without_data_filter).href(),
                active: true,
            }
        } else {
            filter_link(
                "With available data only",
                FilterState {
                    only_with_data: true,
                    ..filters
                },
            )
        };

        Self {
            notification: None,
            location: state.location.clone(),
            health_issue: state.health_issue.clone(),
            error: None,
            search_again: false,
            banners: Vec::new(),
            sections: Vec::new(),
            empty_message: None,
            pager: None,
            scope_links: LocationScope::ALL
                .iter()
                .map(|&location| filter_link(location.label(), FilterState { location, ..filters }))
                .collect(),
            sort_links: SortKey::ALL
                .iter()
                .map(|&sort_by| filter_link(sort_by.label(), FilterState { sort_by, ..filters }))
                .collect(),
            performance_links: PerformanceScope::ALL
                .iter()
                .map(|&performance| {
                    filter_link(performance.label(), FilterState { performance, ..filters })
                })
                .collect(),
            distance_links: DISTANCE_STEPS
                .iter()
                .map(|&miles| {
                    let mut next = filters;
                    next.set_max_distance(miles);
                    filter_link(&format!("{miles} mi"), next)
                })
                .collect(),
            data_link,
            chips: Vec::new(),
            reset_href: None,
            metrics: None,
            time_slots: TIME_SLOTS.to_vec(),
            back_href: state.href(),
            min_date: String::new(),
        }
    }
}

#[derive(Template)]
#[template(path = "booking.html")]
pub struct BookingTemplate {
    pub notification: Option<Notification>,
    pub hospital_name: String,
    pub confirmation: Option<String>,
    pub back_href: String,
}

/// Section order on the page.
pub const SECTION_ORDER: [LocationRelevance; 3] = [
    LocationRelevance::City,
    LocationRelevance::State,
    LocationRelevance::Other,
];
