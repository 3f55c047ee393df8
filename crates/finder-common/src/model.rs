use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Backend-assigned geographic bucket for a hospital relative to the searched location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LocationRelevance {
    City,
    State,
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Ratings {
    pub overall: Option<f64>,
    pub quality: Option<f64>,
    pub safety: Option<f64>,
}

/// Outcome statistics, carried as display strings exactly as the backend sends them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default)]
    pub denominator: String,
    #[serde(default)]
    pub lower_estimate: String,
    #[serde(default)]
    pub higher_estimate: String,
    #[serde(default)]
    pub measure_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    pub score: f64,
    #[serde(default)]
    pub has_data: bool,
    #[serde(default)]
    pub performance_level: String,
    #[serde(default)]
    pub description: String,
    /// `None` only between decoding and [`GroupedHospitals::backfill_relevance`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_relevance: Option<LocationRelevance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Ratings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
}

impl Hospital {
    pub fn is_relevant_to(&self, relevance: LocationRelevance) -> bool {
        self.location_relevance == Some(relevance)
    }

    pub fn overall_rating(&self) -> Option<f64> {
        self.ratings.as_ref().and_then(|r| r.overall)
    }
}

/// The three-way partition of a search result set.
///
/// Order within each sequence is the server's order; the union is the full result set
/// for the query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupedHospitals {
    #[serde(default)]
    pub city_hospitals: Vec<Hospital>,
    #[serde(default)]
    pub state_hospitals: Vec<Hospital>,
    #[serde(default)]
    pub other_hospitals: Vec<Hospital>,
}

impl GroupedHospitals {
    /// Groups a flat hospital list by its backend-assigned relevance.
    /// Hospitals without a relevance tag land in the "other" bucket.
    pub fn from_flat(hospitals: Vec<Hospital>) -> Self {
        let mut grouped = Self::default();
        for mut hospital in hospitals {
            match hospital.location_relevance {
                Some(LocationRelevance::City) => grouped.city_hospitals.push(hospital),
                Some(LocationRelevance::State) => grouped.state_hospitals.push(hospital),
                Some(LocationRelevance::Other) => grouped.other_hospitals.push(hospital),
                None => {
                    hospital.location_relevance = Some(LocationRelevance::Other);
                    grouped.other_hospitals.push(hospital);
                }
            }
        }
        grouped
    }

    /// Tags hospitals the backend left untagged with the bucket they arrived in.
    /// Existing tags are never rewritten.
    pub fn backfill_relevance(&mut self) {
        for (relevance, bucket) in [
            (LocationRelevance::City, &mut self.city_hospitals),
            (LocationRelevance::State, &mut self.state_hospitals),
            (LocationRelevance::Other, &mut self.other_hospitals),
        ] {
            for hospital in bucket.iter_mut() {
                hospital.location_relevance.get_or_insert(relevance);
            }
        }
    }

    pub fn total(&self) -> usize {
        self.city_hospitals.len() + self.state_hospitals.len() + self.other_hospitals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hospital> {
        self.city_hospitals
            .iter()
            .chain(self.state_hospitals.iter())
            .chain(self.other_hospitals.iter())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub has_local_hospitals: bool,
    pub has_state_hospitals: bool,
    pub has_other_hospitals: bool,
}

impl Availability {
    pub fn of(grouped: &GroupedHospitals) -> Self {
        Self {
            has_local_hospitals: !grouped.city_hospitals.is_empty(),
            has_state_hospitals: !grouped.state_hospitals.is_empty(),
            has_other_hospitals: !grouped.other_hospitals.is_empty(),
        }
    }
}

/// A normalised page of grouped search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HospitalSearchResponse {
    pub hospitals: GroupedHospitals,
    pub availability: Availability,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

/// Which column the location autocomplete matches against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum LocationField {
    #[default]
    City,
    State,
    County,
}

impl LocationField {
    pub fn as_str(self) -> &'static str {
        match self {
            LocationField::City => "City",
            LocationField::State => "State",
            LocationField::County => "County",
        }
    }
}

impl std::str::FromStr for LocationField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "City" | "city" => Ok(LocationField::City),
            "State" | "state" => Ok(LocationField::State),
            "County" | "county" => Ok(LocationField::County),
            other => Err(format!(
                "invalid field '{other}'. Valid fields are: City, State, County"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub county: String,
    pub display_string: String,
}

impl Location {
    /// Builds an entry from a bare display string, the other shape the endpoint returns.
    pub fn from_display(display: impl Into<String>) -> Self {
        let display = display.into();
        let (city, state) = match display.split_once(", ") {
            Some((city, state)) => (city.to_string(), state.to_string()),
            None => (display.clone(), String::new()),
        };
        Self {
            id: display.clone(),
            city,
            state,
            display_string: display,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hospital(id: &str, relevance: Option<LocationRelevance>) -> Hospital {
        Hospital {
            id: id.to_string(),
            name: format!("Hospital {id}"),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            county: None,
            score: 10.0,
            has_data: true,
            performance_level: "Excellent".to_string(),
            description: String::new(),
            location_relevance: relevance,
            ratings: None,
            statistics: None,
        }
    }

    #[test]
    fn decodes_backend_hospital_shape() {
        let json = r#"{
            "id": "010001",
            "name": "Southeast Health",
            "address": "1108 Ross Clark Circle",
            "city": "Dothan",
            "state": "AL",
            "zipCode": "36301",
            "county": "Houston",
            "score": 12.5,
            "hasData": true,
            "ratings": {"overall": 2.5, "quality": 2.0, "safety": null},
            "performanceLevel": "Good",
            "description": "Hospital in Dothan, AL",
            "statistics": {
                "denominator": "512",
                "lowerEstimate": "10.1",
                "higherEstimate": "14.9",
                "measureName": "Death rate for heart attack patients"
            }
        }"#;
        let decoded: Hospital = serde_json::from_str(json).unwrap();
        assert_eq!(decoded.zip_code, "36301");
        assert_eq!(decoded.location_relevance, None);
        assert_eq!(decoded.overall_rating(), Some(2.5));
        assert_eq!(decoded.ratings.unwrap().safety, None);
        assert_eq!(decoded.statistics.unwrap().measure_name, "Death rate for heart attack patients");
    }

    #[test]
    fn backfill_keeps_existing_tags() {
        let mut grouped = GroupedHospitals {
            city_hospitals: vec![hospital("a", None)],
            state_hospitals: vec![hospital("b", Some(LocationRelevance::Other))],
            other_hospitals: vec![hospital("c", None)],
        };
        grouped.backfill_relevance();
        assert_eq!(grouped.city_hospitals[0].location_relevance, Some(LocationRelevance::City));
        assert_eq!(grouped.state_hospitals[0].location_relevance, Some(LocationRelevance::Other));
        assert_eq!(grouped.other_hospitals[0].location_relevance, Some(LocationRelevance::Other));
    }

    #[test]
    fn from_flat_groups_by_relevance() {
        let grouped = GroupedHospitals::from_flat(vec![
            hospital("a", Some(LocationRelevance::State)),
            hospital("b", Some(LocationRelevance::City)),
            hospital("c", None),
        ]);
        assert_eq!(grouped.city_hospitals.len(), 1);
        assert_eq!(grouped.state_hospitals.len(), 1);
        assert_eq!(grouped.other_hospitals[0].id, "c");
        assert_eq!(grouped.total(), 3);
        assert_eq!(
            Availability::of(&grouped),
            Availability {
                has_local_hospitals: true,
                has_state_hospitals: true,
                has_other_hospitals: true,
            }
        );
    }

    #[test]
    fn location_from_display_splits_city_and_state() {
        let loc = Location::from_display("Dothan, AL");
        assert_eq!(loc.city, "Dothan");
        assert_eq!(loc.state, "AL");
        assert_eq!(loc.display_string, "Dothan, AL");
    }

    #[test]
    fn location_field_parsing() {
        assert_eq!("".parse::<LocationField>(), Ok(LocationField::City));
        assert_eq!("County".parse::<LocationField>(), Ok(LocationField::County));
        assert!("Zip".parse::<LocationField>().is_err());
    }
}
