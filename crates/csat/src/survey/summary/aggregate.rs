use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::super::domain::{AgeGroup, DemographicValue, EducationLevel, Gender, MaritalStatus};
use super::super::response::SurveyResponse;
use super::super::scoring::{mean, DimensionScores};

/// Display parameters that shape a summary without affecting scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    /// Size of the surveyed population; without it the response rate is 0.
    pub expected_population: Option<u32>,
    /// How many of the newest responses to include.
    pub recent_limit: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            expected_population: None,
            recent_limit: 10,
        }
    }
}

/// Count per value of one demographic field. Every value of the field is
/// present, in declaration order, even when its count is 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally<T: DemographicValue> {
    counts: Vec<(T, usize)>,
}

impl<T: DemographicValue> Tally<T> {
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut counts: Vec<(T, usize)> = T::ordered().iter().map(|value| (*value, 0)).collect();
        for value in values {
            if let Some(entry) = counts.iter_mut().find(|(candidate, _)| *candidate == value) {
                entry.1 += 1;
            }
        }
        Self { counts }
    }

    pub fn get(&self, value: T) -> usize {
        self.counts
            .iter()
            .find(|(candidate, _)| *candidate == value)
            .map(|(_, count)| *count)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (T, usize)> + '_ {
        self.counts.iter().copied()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }
}

impl<T: DemographicValue> Serialize for Tally<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (value, count) in &self.counts {
            map.serialize_entry(value.as_str(), count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicCounts {
    pub gender: Tally<Gender>,
    pub age: Tally<AgeGroup>,
    pub marital_status: Tally<MaritalStatus>,
    pub education_level: Tally<EducationLevel>,
}

impl DemographicCounts {
    pub fn from_responses(responses: &[SurveyResponse]) -> Self {
        let demographics = || responses.iter().map(SurveyResponse::demographics);
        Self {
            gender: Tally::from_values(demographics().map(|d| d.gender)),
            age: Tally::from_values(demographics().map(|d| d.age)),
            marital_status: Tally::from_values(demographics().map(|d| d.marital_status)),
            education_level: Tally::from_values(demographics().map(|d| d.education_level)),
        }
    }
}

/// Dashboard summary, re-derived from the current responses on every query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub total_responses: usize,
    #[serde(rename = "overallCSAT")]
    pub overall_csat: f64,
    pub dimension_scores: DimensionScores,
    pub response_rate: f64,
    pub demographic_counts: DemographicCounts,
    pub recent_responses: Vec<SurveyResponse>,
}

impl AggregateSummary {
    pub fn build(responses: &[SurveyResponse], options: &SummaryOptions) -> Self {
        let total_responses = responses.len();
        let overall_csat = mean(responses.iter().map(SurveyResponse::overall_score));
        let dimension_scores = DimensionScores::from_fn(|dimension| {
            mean(
                responses
                    .iter()
                    .map(|response| response.dimension_scores().get(dimension)),
            )
        });

        let response_rate = match options.expected_population {
            Some(population) if population > 0 => total_responses as f64 / f64::from(population),
            _ => 0.0,
        };

        Self {
            total_responses,
            overall_csat,
            dimension_scores,
            response_rate,
            demographic_counts: DemographicCounts::from_responses(responses),
            recent_responses: most_recent(responses, options.recent_limit),
        }
    }
}

/// Newest first; responses created at the same instant keep their input order.
fn most_recent(responses: &[SurveyResponse], limit: usize) -> Vec<SurveyResponse> {
    let mut ordered: Vec<&SurveyResponse> = responses.iter().collect();
    ordered.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    ordered.into_iter().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::survey::domain::{Demographics, Dimension};
    use crate::survey::questionnaire::{ItemKey, ItemScores};
    use crate::survey::response::ResponseId;

    fn response(id: &str, hour: u32, seed: usize) -> SurveyResponse {
        SurveyResponse::record(
            ResponseId(id.to_string()),
            Utc.with_ymd_and_hms(2024, 5, 10, hour, 0, 0).unwrap(),
            Demographics {
                gender: if seed % 2 == 0 { Gender::Male } else { Gender::Female },
                age: AgeGroup::From31To40,
                marital_status: MaritalStatus::Married,
                education_level: EducationLevel::FirstDegree,
            },
            ItemScores::from_recorded(
                ItemKey::ordered()
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| (item, ((index * seed + seed) % 5 + 1) as i64)),
            ),
        )
    }

    fn ids(summary: &AggregateSummary) -> Vec<&str> {
        summary
            .recent_responses
            .iter()
            .map(|response| response.id().0.as_str())
            .collect()
    }

    #[test]
    fn empty_input_is_zeroed_with_every_tally_key() {
        let summary = AggregateSummary::build(&[], &SummaryOptions::default());

        assert_eq!(summary.total_responses, 0);
        assert_eq!(summary.overall_csat, 0.0);
        assert_eq!(summary.response_rate, 0.0);
        for dimension in Dimension::ordered() {
            assert_eq!(summary.dimension_scores.get(dimension), 0.0);
        }
        let counts = &summary.demographic_counts;
        assert_eq!(counts.gender.iter().count(), Gender::ordered().len());
        assert_eq!(counts.age.iter().count(), AgeGroup::ordered().len());
        assert_eq!(
            counts.marital_status.iter().count(),
            MaritalStatus::ordered().len()
        );
        assert_eq!(
            counts.education_level.iter().count(),
            EducationLevel::ordered().len()
        );
        assert_eq!(counts.gender.total() + counts.age.total(), 0);
        assert_eq!(counts.marital_status.total() + counts.education_level.total(), 0);
        assert!(summary.recent_responses.is_empty());

        let json = serde_json::to_value(&summary).expect("serializes");
        assert_eq!(json["demographicCounts"]["age"]["50+"], serde_json::json!(0));
    }

    #[test]
    fn scalars_do_not_depend_on_input_order() {
        let responses: Vec<SurveyResponse> = (1..=7)
            .map(|seed| response(&format!("r{seed}"), seed as u32, seed))
            .collect();
        let mut reversed = responses.clone();
        reversed.reverse();
        let options = SummaryOptions {
            expected_population: Some(30),
            recent_limit: 10,
        };

        let forward = AggregateSummary::build(&responses, &options);
        let backward = AggregateSummary::build(&reversed, &options);

        assert_eq!(forward.overall_csat.to_bits(), backward.overall_csat.to_bits());
        assert_eq!(forward.response_rate.to_bits(), backward.response_rate.to_bits());
        for dimension in Dimension::ordered() {
            assert_eq!(
                forward.dimension_scores.get(dimension).to_bits(),
                backward.dimension_scores.get(dimension).to_bits()
            );
        }
        assert_eq!(forward.demographic_counts, backward.demographic_counts);
        assert_eq!(forward.recent_responses, backward.recent_responses);
        assert_eq!(AggregateSummary::build(&responses, &options), forward);
    }

    #[test]
    fn recent_responses_are_newest_first_and_stable_on_ties() {
        let responses = vec![
            response("early", 8, 1),
            response("tie-a", 12, 2),
            response("tie-b", 12, 3),
            response("late", 18, 4),
        ];

        let summary = AggregateSummary::build(&responses, &SummaryOptions::default());
        assert_eq!(ids(&summary), ["late", "tie-a", "tie-b", "early"]);

        let truncated = AggregateSummary::build(
            &responses,
            &SummaryOptions {
                expected_population: None,
                recent_limit: 2,
            },
        );
        assert_eq!(ids(&truncated), ["late", "tie-a"]);
        assert_eq!(truncated.total_responses, 4);
    }

    #[test]
    fn response_rate_uses_expected_population() {
        let responses = vec![response("a", 9, 1), response("b", 10, 2)];
        let options = SummaryOptions {
            expected_population: Some(8),
            recent_limit: 10,
        };
        assert_eq!(AggregateSummary::build(&responses, &options).response_rate, 0.25);
        let unset = SummaryOptions {
            expected_population: Some(0),
            recent_limit: 10,
        };
        assert_eq!(AggregateSummary::build(&responses, &unset).response_rate, 0.0);
    }
}
