use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::{Dimension, Language};
use super::super::questionnaire::ItemKey;
use super::super::response::SurveyResponse;
use super::super::scoring::{mean, population_std_dev};

/// Spread of one dimension's per-response scores. Responses that never
/// answered the dimension (score 0) do not contribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionStatistics {
    pub dimension: Dimension,
    pub label: &'static str,
    pub mean: f64,
    pub count: usize,
    pub max: f64,
    pub min: f64,
    pub std_dev: f64,
}

pub fn dimension_statistics(
    responses: &[SurveyResponse],
    language: Language,
) -> Vec<DimensionStatistics> {
    Dimension::ordered()
        .into_iter()
        .map(|dimension| {
            let scores: Vec<f64> = responses
                .iter()
                .map(|response| response.dimension_scores().get(dimension))
                .filter(|score| *score > 0.0)
                .collect();

            let (min, max) = if scores.is_empty() {
                (0.0, 0.0)
            } else {
                scores
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), score| {
                        (lo.min(*score), hi.max(*score))
                    })
            };

            DimensionStatistics {
                dimension,
                label: dimension.label(language),
                mean: mean(scores.iter().copied()),
                count: scores.len(),
                max,
                min,
                std_dev: population_std_dev(&scores),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    Excellent,
    Good,
    Average,
    Poor,
    VeryPoor,
}

impl PerformanceLevel {
    pub fn from_mean(mean: f64) -> Self {
        if mean >= 4.5 {
            Self::Excellent
        } else if mean >= 4.0 {
            Self::Good
        } else if mean >= 3.0 {
            Self::Average
        } else if mean >= 2.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    pub const fn label(self, language: Language) -> &'static str {
        match self {
            Self::Excellent => language.pick("Excellent", "በጣም ጥሩ"),
            Self::Good => language.pick("Good", "ጥሩ"),
            Self::Average => language.pick("Average", "መካከለኛ"),
            Self::Poor => language.pick("Poor", "ደካማ"),
            Self::VeryPoor => language.pick("Very Poor", "በጣም ደካማ"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPerformance {
    pub item: ItemKey,
    pub text: &'static str,
    pub dimension: Dimension,
    pub mean: f64,
    pub answered: usize,
    pub level: PerformanceLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceSort {
    /// Catalog order.
    #[default]
    Catalog,
    Asc,
    Desc,
}

/// One row per catalog item. Ties keep catalog order under either sort.
pub fn question_performance(
    responses: &[SurveyResponse],
    language: Language,
    sort: PerformanceSort,
) -> Vec<QuestionPerformance> {
    let mut rows: Vec<QuestionPerformance> = ItemKey::ordered()
        .into_iter()
        .map(|item| {
            let answers: Vec<f64> = responses
                .iter()
                .filter_map(|response| response.item_scores().get(item))
                .map(f64::from)
                .collect();
            let mean = mean(answers.iter().copied());
            QuestionPerformance {
                item,
                text: item.text(language),
                dimension: item.dimension(),
                mean,
                answered: answers.len(),
                level: PerformanceLevel::from_mean(mean),
            }
        })
        .collect();

    match sort {
        PerformanceSort::Catalog => {}
        PerformanceSort::Asc => rows.sort_by(|a, b| a.mean.total_cmp(&b.mean)),
        PerformanceSort::Desc => rows.sort_by(|a, b| b.mean.total_cmp(&a.mean)),
    }
    rows
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub total_responses: usize,
    pub total_questions: usize,
    pub last_response_at: Option<DateTime<Utc>>,
}

impl DatabaseStats {
    pub fn collect(responses: &[SurveyResponse], active_questions: usize) -> Self {
        Self {
            total_responses: responses.len(),
            total_questions: active_questions,
            last_response_at: responses.iter().map(SurveyResponse::created_at).max(),
        }
    }
}
