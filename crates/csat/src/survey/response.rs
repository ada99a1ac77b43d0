use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::Demographics;
use super::questionnaire::ItemScores;
use super::scoring::{self, DimensionScores};

/// Identifier assigned by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseId(pub String);

/// A stored survey response. Derived scores are computed from the item
/// scores when the value is built and cannot be set independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    id: ResponseId,
    created_at: DateTime<Utc>,
    demographics: Demographics,
    item_scores: ItemScores,
    dimension_scores: DimensionScores,
    overall_score: f64,
}

impl SurveyResponse {
    pub fn record(
        id: ResponseId,
        created_at: DateTime<Utc>,
        demographics: Demographics,
        item_scores: ItemScores,
    ) -> Self {
        let card = scoring::score(&item_scores);
        Self {
            id,
            created_at,
            demographics,
            item_scores,
            dimension_scores: card.dimension_scores,
            overall_score: card.overall_score,
        }
    }

    pub fn id(&self) -> &ResponseId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn demographics(&self) -> &Demographics {
        &self.demographics
    }

    pub fn item_scores(&self) -> &ItemScores {
        &self.item_scores
    }

    pub fn dimension_scores(&self) -> &DimensionScores {
        &self.dimension_scores
    }

    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }
}

/// A validated submission that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSurveyResponse {
    pub demographics: Demographics,
    pub item_scores: ItemScores,
    /// Creation time to keep when importing historical rows; the store stamps
    /// the current time otherwise.
    pub recorded_at: Option<DateTime<Utc>>,
}

impl NewSurveyResponse {
    pub fn into_response(self, id: ResponseId, created_at: DateTime<Utc>) -> SurveyResponse {
        SurveyResponse::record(
            id,
            self.recorded_at.unwrap_or(created_at),
            self.demographics,
            self.item_scores,
        )
    }
}
