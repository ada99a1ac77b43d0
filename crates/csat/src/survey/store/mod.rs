//! Record store abstraction and the row shapes it persists.

mod rest;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::clear::{ClearSelection, DateRange, DemographicCriteria};
use super::domain::{AgeGroup, Demographics, Dimension, EducationLevel, Gender, MaritalStatus};
use super::questionnaire::{ItemKey, ItemScores, Question, QuestionDraft, QuestionId};
use super::response::{NewSurveyResponse, ResponseId, SurveyResponse};
use super::scoring::DimensionScores;

pub use rest::RestSurveyStore;

/// Persistence of survey responses so the service can be exercised in isolation.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<SurveyResponse>, StoreError>;
    async fn fetch_by_date_range(&self, range: &DateRange)
        -> Result<Vec<SurveyResponse>, StoreError>;
    async fn fetch_by_demographics(
        &self,
        criteria: &DemographicCriteria,
    ) -> Result<Vec<SurveyResponse>, StoreError>;
    async fn insert(&self, response: NewSurveyResponse) -> Result<SurveyResponse, StoreError>;
    /// Insert every response in one call; nothing is stored if the call fails.
    async fn insert_batch(
        &self,
        responses: Vec<NewSurveyResponse>,
    ) -> Result<Vec<SurveyResponse>, StoreError>;
    /// Delete every matching response and report how many were removed.
    async fn delete_matching(&self, selection: &ClearSelection) -> Result<usize, StoreError>;
}

/// Administrator-managed questionnaire rows.
#[async_trait]
pub trait QuestionCatalog: Send + Sync {
    /// All questions, ordered by `order_number`.
    async fn list_questions(&self) -> Result<Vec<Question>, StoreError>;
    async fn create_question(&self, draft: QuestionDraft) -> Result<Question, StoreError>;
    async fn update_question(
        &self,
        id: &QuestionId,
        draft: QuestionDraft,
    ) -> Result<Question, StoreError>;
    async fn set_question_active(
        &self,
        id: &QuestionId,
        active: bool,
    ) -> Result<Question, StoreError>;
}

/// A store holding both responses and the question catalog.
pub trait SurveyStore: ResponseStore + QuestionCatalog {}

impl<T> SurveyStore for T where T: ResponseStore + QuestionCatalog {}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Transport(String),
    #[error("record store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected record store payload: {0}")]
    Decode(String),
    #[error("record not found")]
    NotFound,
}

impl From<reqwest::Error> for StoreError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

/// Row written to the responses table.
#[derive(Debug, Clone, Serialize)]
pub struct NewResponseRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub gender: Gender,
    pub age: AgeGroup,
    pub marital_status: MaritalStatus,
    pub education_level: EducationLevel,
    pub responses: BTreeMap<Dimension, BTreeMap<ItemKey, u8>>,
    pub dimension_scores: DimensionScores,
    pub overall_score: f64,
}

impl From<&NewSurveyResponse> for NewResponseRow {
    fn from(value: &NewSurveyResponse) -> Self {
        let card = super::scoring::score(&value.item_scores);
        Self {
            created_at: value.recorded_at,
            gender: value.demographics.gender,
            age: value.demographics.age,
            marital_status: value.demographics.marital_status,
            education_level: value.demographics.education_level,
            responses: value.item_scores.by_dimension(),
            dimension_scores: card.dimension_scores,
            overall_score: card.overall_score,
        }
    }
}

/// Row read back from the responses table. Stored derived scores are ignored
/// and recomputed from the item ratings; unknown item ids are skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseRow {
    #[serde(deserialize_with = "deserialize_row_id")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub gender: Gender,
    pub age: AgeGroup,
    pub marital_status: MaritalStatus,
    pub education_level: EducationLevel,
    #[serde(default)]
    pub responses: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl ResponseRow {
    pub fn into_response(self) -> SurveyResponse {
        let ratings = self
            .responses
            .into_values()
            .flat_map(BTreeMap::into_iter)
            .filter_map(|(key, value)| Some((ItemKey::from_id(&key)?, value.as_i64()?)));

        SurveyResponse::record(
            ResponseId(self.id),
            self.created_at,
            Demographics {
                gender: self.gender,
                age: self.age,
                marital_status: self.marital_status,
                education_level: self.education_level,
            },
            ItemScores::from_recorded(ratings),
        )
    }
}

/// Row shape of the questions table.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRow {
    #[serde(deserialize_with = "deserialize_row_id")]
    pub id: String,
    pub dimension: Dimension,
    pub text_amharic: String,
    pub text_english: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub order_number: u16,
}

fn default_active() -> bool {
    true
}

impl From<QuestionRow> for Question {
    fn from(value: QuestionRow) -> Self {
        Question {
            id: QuestionId(value.id),
            dimension: value.dimension,
            text_amharic: value.text_amharic,
            text_english: value.text_english,
            is_active: value.is_active,
            order_number: value.order_number,
        }
    }
}

/// Draft fields in the questions table's column spelling.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionDraftRow<'a> {
    pub dimension: Dimension,
    pub text_amharic: &'a str,
    pub text_english: &'a str,
    pub order_number: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl<'a> From<&'a QuestionDraft> for QuestionDraftRow<'a> {
    fn from(value: &'a QuestionDraft) -> Self {
        Self {
            dimension: value.dimension,
            text_amharic: &value.text_amharic,
            text_english: &value.text_english,
            order_number: value.order_number,
            is_active: None,
        }
    }
}

/// Stores hand out either textual or numeric primary keys.
fn deserialize_row_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}
