//! Selection and removal of stored responses.
//!
//! A [`ClearSelection`] is one of three closed modes. The demographic mode
//! cannot be built without at least one field, so "delete everything" is only
//! ever reachable through [`ClearSelection::All`]. The engine refuses to run
//! unless the request carries the confirmation phrase.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{AgeGroup, Demographics, EducationLevel, Gender, MaritalStatus};
use super::response::SurveyResponse;
use super::store::{ResponseStore, StoreError};

/// Literal an administrator must type before anything is deleted.
pub const CONFIRMATION_PHRASE: &str = "DELETE";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("a demographic filter needs at least one field")]
    EmptyDemographicFilter,
    #[error("date range starts ({from}) after it ends ({to})")]
    InvertedDateRange { from: NaiveDate, to: NaiveDate },
    #[error("a date range needs both a start and an end date")]
    IncompleteDateRange,
}

/// Inclusive calendar-date range, compared against the UTC date of `createdAt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, SelectionError> {
        if from > to {
            return Err(SelectionError::InvertedDateRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// Both bounds or neither; a single bound is rejected.
    pub fn from_bounds(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Option<Self>, SelectionError> {
        match (from, to) {
            (Some(from), Some(to)) => Self::new(from, to).map(Some),
            (None, None) => Ok(None),
            _ => Err(SelectionError::IncompleteDateRange),
        }
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, response: &SurveyResponse) -> bool {
        let day = response.created_at().date_naive();
        self.from <= day && day <= self.to
    }
}

/// Optional equality constraints on the demographic fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicCriteria {
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub age: Option<AgeGroup>,
    #[serde(default, alias = "marital_status")]
    pub marital_status: Option<MaritalStatus>,
    #[serde(default, alias = "education_level")]
    pub education_level: Option<EducationLevel>,
}

impl DemographicCriteria {
    pub fn is_empty(&self) -> bool {
        self.gender.is_none()
            && self.age.is_none()
            && self.marital_status.is_none()
            && self.education_level.is_none()
    }

    /// Conjunction over the supplied fields; no fields matches everything.
    pub fn matches(&self, demographics: &Demographics) -> bool {
        self.gender.map_or(true, |v| v == demographics.gender)
            && self.age.map_or(true, |v| v == demographics.age)
            && self
                .marital_status
                .map_or(true, |v| v == demographics.marital_status)
            && self
                .education_level
                .map_or(true, |v| v == demographics.education_level)
    }
}

/// Criteria with at least one field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DemographicFilter(DemographicCriteria);

impl DemographicFilter {
    pub fn new(criteria: DemographicCriteria) -> Result<Self, SelectionError> {
        if criteria.is_empty() {
            return Err(SelectionError::EmptyDemographicFilter);
        }
        Ok(Self(criteria))
    }

    pub fn criteria(&self) -> &DemographicCriteria {
        &self.0
    }
}

impl TryFrom<DemographicCriteria> for DemographicFilter {
    type Error = SelectionError;

    fn try_from(value: DemographicCriteria) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearSelection {
    All,
    DateRange(DateRange),
    Demographics(DemographicFilter),
}

impl ClearSelection {
    pub fn matches(&self, response: &SurveyResponse) -> bool {
        match self {
            Self::All => true,
            Self::DateRange(range) => range.contains(response),
            Self::Demographics(filter) => filter.criteria().matches(response.demographics()),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::DateRange(_) => "date_range",
            Self::Demographics(_) => "demographics",
        }
    }
}

/// Untrusted wire shape; converted into a [`ClearSelection`] with validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SelectionPayload {
    All,
    DateRange {
        #[serde(alias = "dateFrom")]
        date_from: NaiveDate,
        #[serde(alias = "dateTo")]
        date_to: NaiveDate,
    },
    Demographics {
        #[serde(flatten)]
        criteria: DemographicCriteria,
    },
}

impl TryFrom<SelectionPayload> for ClearSelection {
    type Error = SelectionError;

    fn try_from(value: SelectionPayload) -> Result<Self, Self::Error> {
        match value {
            SelectionPayload::All => Ok(Self::All),
            SelectionPayload::DateRange { date_from, date_to } => {
                DateRange::new(date_from, date_to).map(Self::DateRange)
            }
            SelectionPayload::Demographics { criteria } => {
                DemographicFilter::new(criteria).map(Self::Demographics)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearRequest {
    pub selection: ClearSelection,
    pub confirmation: String,
}

impl ClearRequest {
    pub fn new(selection: ClearSelection, confirmation: impl Into<String>) -> Self {
        Self {
            selection,
            confirmation: confirmation.into(),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmation == CONFIRMATION_PHRASE
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClearRequestPayload {
    pub selection: SelectionPayload,
    #[serde(default)]
    pub confirmation: String,
}

impl TryFrom<ClearRequestPayload> for ClearRequest {
    type Error = SelectionError;

    fn try_from(value: ClearRequestPayload) -> Result<Self, Self::Error> {
        Ok(Self::new(value.selection.try_into()?, value.confirmation))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClearOutcome {
    pub count: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ClearError {
    #[error("type DELETE to confirm deletion")]
    Unconfirmed,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Remove every stored response matched by the request's selection.
pub async fn clear<S>(store: &S, request: &ClearRequest) -> Result<ClearOutcome, ClearError>
where
    S: ResponseStore + ?Sized,
{
    if !request.is_confirmed() {
        warn!(mode = request.selection.mode(), "clear request rejected: not confirmed");
        return Err(ClearError::Unconfirmed);
    }

    let count = store.delete_matching(&request.selection).await?;
    info!(mode = request.selection.mode(), count, "cleared survey responses");
    Ok(ClearOutcome { count })
}
