//! Bilingual customer-satisfaction survey: intake, scoring, the analytics
//! dashboard, and administrator maintenance.
//!
//! Responses are scored on five service-quality dimensions of three items
//! each. Every aggregate is recomputed from the stored responses on demand.

pub mod auth;
pub mod clear;
pub mod domain;
pub mod export;
pub mod intake;
pub mod questionnaire;
pub mod response;
pub mod router;
pub mod sample;
pub mod scoring;
pub mod service;
pub mod store;
pub mod summary;

#[cfg(test)]
mod tests;

pub use auth::{
    AdminContext, AdminSetupForm, AdminUser, AuthError, AuthGateway, Credentials,
    RestAuthGateway, Session, SetupError,
};
pub use clear::{
    ClearError, ClearOutcome, ClearRequest, ClearSelection, DateRange, DemographicCriteria,
    DemographicFilter, SelectionError, CONFIRMATION_PHRASE,
};
pub use domain::{
    AgeGroup, DemographicValue, Demographics, Dimension, EducationLevel, Gender, Language,
    MaritalStatus,
};
pub use export::{ExportError, Report};
pub use intake::{
    DemographicAnswers, IntakeError, IntakeValidator, MissingItemPolicy, SurveySubmission,
};
pub use questionnaire::{
    standard_catalog, ItemKey, ItemScores, Question, QuestionDraft, QuestionDraftError,
    QuestionId,
};
pub use response::{NewSurveyResponse, ResponseId, SurveyResponse};
pub use router::survey_router;
pub use sample::{import_responses_csv, sample_responses, SampleError};
pub use scoring::{DimensionScores, ScoreCard};
pub use service::{AnalysisFilter, ExportedFile, ImportOutcome, SurveyService, SurveyServiceError};
pub use store::{
    QuestionCatalog, ResponseStore, RestSurveyStore, StoreError, SurveyStore,
};
pub use summary::{
    AggregateSummary, DatabaseStats, DemographicCounts, DimensionStatistics, PerformanceLevel,
    PerformanceSort, QuestionPerformance, SummaryOptions,
};
