use schemars::JsonSchema;
use serde::Serialize;

use crate::model::Hospital;

pub const SCORE_BUCKET_LABELS: [&str; 5] = ["0-20", "21-40", "41-60", "61-80", "81-100"];

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBucket {
    pub label: String,
    pub count: usize,
}

/// Aggregate figures for a list of hospitals.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HospitalMetrics {
    pub count: usize,
    pub average_score: f64,
    /// Unrated hospitals count as 0.
    pub average_quality: f64,
    pub histogram: Vec<ScoreBucket>,
}

impl HospitalMetrics {
    pub fn from_hospitals<'a>(hospitals: impl IntoIterator<Item = &'a Hospital>) -> Self {
        let mut count = 0usize;
        let mut score_sum = 0.0;
        let mut quality_sum = 0.0;
        let mut buckets = [0usize; SCORE_BUCKET_LABELS.len()];

        for hospital in hospitals {
            count += 1;
            score_sum += hospital.score;
            quality_sum += hospital
                .ratings
                .as_ref()
                .and_then(|r| r.quality)
                .unwrap_or(0.0);
            buckets[bucket_index(hospital.score)] += 1;
        }

        let average = |sum: f64| if count == 0 { 0.0 } else { sum / count as f64 };

        Self {
            count,
            average_score: average(score_sum),
            average_quality: average(quality_sum),
            histogram: SCORE_BUCKET_LABELS
                .iter()
                .zip(buckets)
                .map(|(label, count)| ScoreBucket {
                    label: (*label).to_string(),
                    count,
                })
                .collect(),
        }
    }
}

/// `floor(score / 20)`, clamped into the bucket range.
fn bucket_index(score: f64) -> usize {
    let last = SCORE_BUCKET_LABELS.len() - 1;
    if !score.is_finite() || score <= 0.0 {
        return 0;
    }
    ((score / 20.0).floor() as usize).min(last)
}
