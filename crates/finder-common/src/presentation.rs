//! View models for the results page. Everything here is derived; nothing is fetched.

use schemars::JsonSchema;
use serde::Serialize;

use crate::filter::FilterChip;
use crate::model::{GroupedHospitals, Hospital, LocationRelevance};
use crate::pagination::{PageState, SectionPager};

pub const MAX_STARS: u8 = 5;
pub const NO_MATCHES_MESSAGE: &str = "No hospitals found matching your criteria.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BannerTone {
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Banner {
    pub tone: BannerTone,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HospitalCard {
    pub id: String,
    pub name: String,
    pub address_line: String,
    pub performance_level: String,
    /// `floor(ratings.overall)`, 0 when unrated.
    pub filled_stars: u8,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

impl HospitalCard {
    pub fn from_hospital(hospital: &Hospital) -> Self {
        let filled_stars = hospital
            .overall_rating()
            .filter(|r| r.is_finite())
            .map(|r| r.floor().clamp(0.0, f64::from(MAX_STARS)) as u8)
            .unwrap_or(0);

        let state_zip = [hospital.state.trim(), hospital.zip_code.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let address_line = [hospital.address.trim(), hospital.city.trim(), state_zip.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let stats = hospital.statistics.as_ref();
        Self {
            id: hospital.id.clone(),
            name: hospital.name.clone(),
            address_line,
            performance_level: hospital.performance_level.clone(),
            filled_stars,
            description: hospital.description.clone(),
            sample_size: stats.map(|s| format!("Sample size: {}", s.denominator)),
            range: stats.map(|s| format!("Range: {}% - {}%", s.lower_estimate, s.higher_estimate)),
        }
    }

    pub fn empty_stars(&self) -> u8 {
        MAX_STARS - self.filled_stars
    }
}

/// `N hospital(s) found`.
pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 hospital found".to_string()
    } else {
        format!("{count} hospitals found")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionView {
    pub relevance: LocationRelevance,
    pub heading: String,
    pub subtitle: String,
    pub count_label: String,
    pub cards: Vec<HospitalCard>,
    pub page: usize,
    pub total_pages: usize,
}

impl SectionView {
    pub fn shows_controls(&self) -> bool {
        self.total_pages > 1
    }
}

/// One local pager per section.
#[derive(Debug, Clone, Default)]
pub struct SectionPagers {
    pub city: SectionPager,
    pub state: SectionPager,
    pub other: SectionPager,
}

impl SectionPagers {
    pub fn get_mut(&mut self, relevance: LocationRelevance) -> &mut SectionPager {
        match relevance {
            LocationRelevance::City => &mut self.city,
            LocationRelevance::State => &mut self.state,
            LocationRelevance::Other => &mut self.other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultsPage {
    pub location: String,
    pub health_issue: String,
    pub banners: Vec<Banner>,
    pub sections: Vec<SectionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
    /// Present only when there is more than one server page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageState>,
    pub chips: Vec<FilterChip>,
}

/// Build the results page from the filtered page of hospitals.
///
/// Each pager is synced against its section's list first, so a section whose list
/// changed goes back to its first page.
pub fn results_page(
    location: &str,
    health_issue: &str,
    filtered: &GroupedHospitals,
    pages: PageState,
    chips: Vec<FilterChip>,
    pagers: &mut SectionPagers,
) -> ResultsPage {
    let no_city = filtered.city_hospitals.is_empty();
    let no_state = filtered.state_hospitals.is_empty();

    let mut banners = Vec::new();
    if no_city && no_state {
        banners.push(Banner {
            tone: BannerTone::Warning,
            message: format!(
                "No hospitals found in {location} or the surrounding state. Showing hospitals from other locations that may be relevant."
            ),
        });
    }
    if no_city {
        let mut message = format!("No hospitals found in {location}.");
        if !no_state {
            message.push_str(" Showing hospitals from surrounding areas.");
        }
        banners.push(Banner {
            tone: BannerTone::Info,
            message,
        });
    }

    let other_subtitle = if no_city && no_state {
        "No local hospitals found. Showing hospitals from other areas that may be relevant."
            .to_string()
    } else {
        "These hospitals are outside your state but may be relevant".to_string()
    };

    let specs = [
        (
            LocationRelevance::City,
            &filtered.city_hospitals,
            format!("Hospitals in {location}"),
            "These hospitals are located within your city".to_string(),
        ),
        (
            LocationRelevance::State,
            &filtered.state_hospitals,
            "Hospitals in Your State".to_string(),
            format!("These hospitals are in your state but outside {location}"),
        ),
        (
            LocationRelevance::Other,
            &filtered.other_hospitals,
            "Other Relevant Hospitals".to_string(),
            other_subtitle,
        ),
    ];

    let mut sections = Vec::new();
    for (relevance, list, heading, subtitle) in specs {
        let pager = pagers.get_mut(relevance);
        pager.sync(list);
        if list.is_empty() {
            continue;
        }
        sections.push(SectionView {
            relevance,
            heading,
            subtitle,
            count_label: count_label(list.len()),
            cards: pager.slice(list).iter().map(HospitalCard::from_hospital).collect(),
            page: pager.current_page(),
            total_pages: pager.total_pages(list.len()),
        });
    }

    ResultsPage {
        location: location.to_string(),
        health_issue: health_issue.to_string(),
        banners,
        empty_message: filtered.is_empty().then(|| NO_MATCHES_MESSAGE.to_string()),
        sections,
        pagination: pages.shows_controls().then_some(pages),
        chips,
    }
}
