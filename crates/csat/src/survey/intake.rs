//! Validation of public survey submissions.
//!
//! A submission carries the four demographic answers plus the item ratings
//! nested by dimension. Validation either yields a complete
//! [`NewSurveyResponse`] or rejects the whole submission; nothing partial is
//! ever handed to the record store.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::{AgeGroup, Demographics, Dimension, EducationLevel, Gender, MaritalStatus};
use super::questionnaire::{ItemKey, ItemScores, MAX_SCORE, MIN_SCORE, NEUTRAL_SCORE};
use super::response::NewSurveyResponse;

/// How to treat items a respondent left unanswered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingItemPolicy {
    /// Refuse the submission and name the missing items.
    #[default]
    Reject,
    /// Record unanswered items as the neutral rating (3).
    Neutral,
}

/// Demographic answers as received; any field may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicAnswers {
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub age: Option<AgeGroup>,
    #[serde(default)]
    pub marital_status: Option<MaritalStatus>,
    #[serde(default)]
    pub education_level: Option<EducationLevel>,
}

impl From<Demographics> for DemographicAnswers {
    fn from(value: Demographics) -> Self {
        Self {
            gender: Some(value.gender),
            age: Some(value.age),
            marital_status: Some(value.marital_status),
            education_level: Some(value.education_level),
        }
    }
}

/// Submission payload produced by the public survey form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveySubmission {
    pub demographics: DemographicAnswers,
    #[serde(default)]
    pub responses: BTreeMap<Dimension, BTreeMap<ItemKey, i64>>,
}

impl SurveySubmission {
    /// Build a submission from flat item ratings, nesting them by dimension.
    pub fn from_ratings<I>(demographics: DemographicAnswers, ratings: I) -> Self
    where
        I: IntoIterator<Item = (ItemKey, i64)>,
    {
        let mut responses: BTreeMap<Dimension, BTreeMap<ItemKey, i64>> = BTreeMap::new();
        for (item, rating) in ratings {
            responses
                .entry(item.dimension())
                .or_default()
                .insert(item, rating);
        }
        Self {
            demographics,
            responses,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("demographic field '{0}' is required")]
    MissingDemographic(&'static str),
    #[error("missing ratings for {}", MissingItems(.0))]
    MissingItems(Vec<ItemKey>),
    #[error("rating for {} must be between 1 and 5 (got {value})", .item.id())]
    ScoreOutOfRange { item: ItemKey, value: i64 },
    #[error("{} is not part of the {} dimension", .item.id(), .dimension.as_str())]
    MisplacedItem { item: ItemKey, dimension: Dimension },
}

struct MissingItems<'a>(&'a [ItemKey]);

impl fmt::Display for MissingItems<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, item) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            f.write_str(item.id())?;
        }
        Ok(())
    }
}

/// Checks submissions for completeness and range before they reach the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntakeValidator {
    policy: MissingItemPolicy,
}

impl IntakeValidator {
    pub fn new(policy: MissingItemPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MissingItemPolicy {
        self.policy
    }

    pub fn validate(&self, submission: SurveySubmission) -> Result<NewSurveyResponse, IntakeError> {
        let demographics = complete_demographics(submission.demographics)?;

        let mut ratings = BTreeMap::new();
        for (dimension, items) in submission.responses {
            for (item, value) in items {
                if item.dimension() != dimension {
                    return Err(IntakeError::MisplacedItem { item, dimension });
                }
                if !(MIN_SCORE as i64..=MAX_SCORE as i64).contains(&value) {
                    return Err(IntakeError::ScoreOutOfRange { item, value });
                }
                ratings.insert(item, value as u8);
            }
        }

        let missing: Vec<ItemKey> = ItemKey::ordered()
            .into_iter()
            .filter(|item| !ratings.contains_key(item))
            .collect();

        if !missing.is_empty() {
            match self.policy {
                MissingItemPolicy::Reject => return Err(IntakeError::MissingItems(missing)),
                MissingItemPolicy::Neutral => {
                    for item in missing {
                        ratings.insert(item, NEUTRAL_SCORE);
                    }
                }
            }
        }

        Ok(NewSurveyResponse {
            demographics,
            item_scores: ItemScores::from_validated(ratings),
            recorded_at: None,
        })
    }
}

fn complete_demographics(answers: DemographicAnswers) -> Result<Demographics, IntakeError> {
    Ok(Demographics {
        gender: answers
            .gender
            .ok_or(IntakeError::MissingDemographic("gender"))?,
        age: answers.age.ok_or(IntakeError::MissingDemographic("age"))?,
        marital_status: answers
            .marital_status
            .ok_or(IntakeError::MissingDemographic("maritalStatus"))?,
        education_level: answers
            .education_level
            .ok_or(IntakeError::MissingDemographic("educationLevel"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demographics() -> DemographicAnswers {
        DemographicAnswers {
            gender: Some(Gender::Female),
            age: Some(AgeGroup::From31To40),
            marital_status: Some(MaritalStatus::Single),
            education_level: Some(EducationLevel::Diploma),
        }
    }

    fn full_ratings(value: i64) -> Vec<(ItemKey, i64)> {
        ItemKey::ordered().into_iter().map(|item| (item, value)).collect()
    }

    #[test]
    fn accepts_complete_submission() {
        let submission = SurveySubmission::from_ratings(demographics(), full_ratings(4));
        let response = IntakeValidator::default()
            .validate(submission)
            .expect("complete submission accepted");
        assert!(response.item_scores.is_complete());
        assert_eq!(response.demographics.gender, Gender::Female);
    }

    #[test]
    fn rejects_missing_demographic_before_scores() {
        let mut answers = demographics();
        answers.marital_status = None;
        let submission = SurveySubmission::from_ratings(answers, full_ratings(9));
        let err = IntakeValidator::default()
            .validate(submission)
            .expect_err("incomplete demographics rejected");
        assert_eq!(err, IntakeError::MissingDemographic("maritalStatus"));
    }

    #[test]
    fn rejects_missing_items_by_default() {
        let mut ratings = full_ratings(4);
        ratings.retain(|(item, _)| *item != ItemKey::Courtesy && *item != ItemKey::Equipment);
        let submission = SurveySubmission::from_ratings(demographics(), ratings);
        let err = IntakeValidator::default()
            .validate(submission)
            .expect_err("missing items rejected");
        assert_eq!(
            err,
            IntakeError::MissingItems(vec![ItemKey::Equipment, ItemKey::Courtesy])
        );
        assert_eq!(
            err.to_string(),
            "missing ratings for q2_equipment, q11_courtesy"
        );
    }

    #[test]
    fn neutral_policy_fills_missing_items_with_three() {
        let submission = SurveySubmission::from_ratings(
            demographics(),
            [(ItemKey::Facilities, 5), (ItemKey::BestInterests, 1)],
        );
        let response = IntakeValidator::new(MissingItemPolicy::Neutral)
            .validate(submission)
            .expect("neutral policy accepts");
        assert!(response.item_scores.is_complete());
        assert_eq!(response.item_scores.get(ItemKey::Facilities), Some(5));
        assert_eq!(response.item_scores.get(ItemKey::Dependable), Some(3));
    }

    #[test]
    fn rejects_out_of_range_ratings() {
        let mut ratings = full_ratings(3);
        ratings[4].1 = 6;
        let submission = SurveySubmission::from_ratings(demographics(), ratings);
        let err = IntakeValidator::new(MissingItemPolicy::Neutral)
            .validate(submission)
            .expect_err("out of range rejected");
        assert_eq!(
            err,
            IntakeError::ScoreOutOfRange {
                item: ItemKey::Willingness,
                value: 6
            }
        );
    }

    #[test]
    fn rejects_items_filed_under_the_wrong_dimension() {
        let mut submission = SurveySubmission::from_ratings(demographics(), full_ratings(3));
        submission
            .responses
            .entry(Dimension::Empathy)
            .or_default()
            .insert(ItemKey::Facilities, 2);
        let err = IntakeValidator::default()
            .validate(submission)
            .expect_err("misplaced item rejected");
        assert!(matches!(err, IntakeError::MisplacedItem { .. }));
    }

    #[test]
    fn parses_nested_wire_format() {
        let payload = serde_json::json!({
            "demographics": {
                "gender": "male",
                "age": "50+",
                "maritalStatus": "widowed",
                "educationLevel": "1-8"
            },
            "responses": {
                "tangibility": { "q1_facilities": 5, "q2_equipment": 4, "q3_materials": 3 }
            }
        });
        let submission: SurveySubmission = serde_json::from_value(payload).expect("parses");
        assert_eq!(submission.demographics.age, Some(AgeGroup::Over50));
        assert_eq!(
            submission.responses[&Dimension::Tangibility][&ItemKey::Equipment],
            4
        );
    }
}
