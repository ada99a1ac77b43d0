use serde::Serialize;

use super::domain::Dimension;
use super::questionnaire::ItemScores;

/// Mean score per dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DimensionScores {
    pub tangibility: f64,
    pub responsiveness: f64,
    pub reliability: f64,
    pub assurance: f64,
    pub empathy: f64,
}

impl DimensionScores {
    pub fn from_fn<F>(mut score: F) -> Self
    where
        F: FnMut(Dimension) -> f64,
    {
        Self {
            tangibility: score(Dimension::Tangibility),
            responsiveness: score(Dimension::Responsiveness),
            reliability: score(Dimension::Reliability),
            assurance: score(Dimension::Assurance),
            empathy: score(Dimension::Empathy),
        }
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Tangibility => self.tangibility,
            Dimension::Responsiveness => self.responsiveness,
            Dimension::Reliability => self.reliability,
            Dimension::Assurance => self.assurance,
            Dimension::Empathy => self.empathy,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ordered()
            .into_iter()
            .map(move |dimension| (dimension, self.get(dimension)))
    }
}

/// Derived scores for a single response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCard {
    pub dimension_scores: DimensionScores,
    pub overall_score: f64,
}

/// Score one response. Each dimension is the mean of its answered items and
/// the overall score is the mean of every answered item; an empty group scores 0.
pub fn score(items: &ItemScores) -> ScoreCard {
    let dimension_scores = DimensionScores::from_fn(|dimension| {
        mean(
            dimension
                .items()
                .into_iter()
                .filter_map(|item| items.get(item))
                .map(f64::from),
        )
    });
    let overall_score = mean(items.iter().map(|(_, score)| f64::from(score)));

    ScoreCard {
        dimension_scores,
        overall_score,
    }
}

/// Arithmetic mean that is 0 for an empty input. Values are summed in sorted
/// order so the result does not depend on the input order.
pub fn mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut values: Vec<f64> = values.into_iter().collect();
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (denominator = count); 0 for an empty input.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values.iter().copied());
    let variance = mean(values.iter().map(|value| (value - avg).powi(2)));
    variance.sqrt()
}
