use std::io::Read;
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::auth::{
    AdminContext, AdminSetupForm, AdminUser, AuthError, AuthGateway, Credentials, Session,
    SetupError,
};
use super::clear::{self, ClearError, ClearOutcome, ClearRequest, DateRange, DemographicCriteria};
use super::domain::Language;
use super::export::{self, ExportError, XLSX_CONTENT_TYPE};
use super::intake::{IntakeError, IntakeValidator, SurveySubmission};
use super::questionnaire::{Question, QuestionDraft, QuestionDraftError, QuestionId};
use super::response::SurveyResponse;
use super::sample::{self, SampleError};
use super::store::{StoreError, SurveyStore};
use super::summary::{
    dimension_statistics, question_performance, AggregateSummary, DatabaseStats,
    DimensionStatistics, PerformanceSort, QuestionPerformance, SummaryOptions,
};
use crate::config::SurveyConfig;

/// Service composing intake validation, the record store, and the auth gateway.
pub struct SurveyService<S, A> {
    store: Arc<S>,
    auth: Arc<A>,
    validator: IntakeValidator,
    options: SummaryOptions,
}

/// Optional read filter for the dashboard. Unlike a clear selection, an
/// empty filter is allowed and means every response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisFilter {
    pub criteria: DemographicCriteria,
    pub range: Option<DateRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub count: usize,
}

/// A rendered download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl<S, A> SurveyService<S, A>
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    pub fn new(store: Arc<S>, auth: Arc<A>, config: &SurveyConfig) -> Self {
        Self {
            store,
            auth,
            validator: IntakeValidator::new(config.missing_item_policy),
            options: config.summary_options(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn validator(&self) -> &IntakeValidator {
        &self.validator
    }

    /// Validate and persist a public submission.
    pub async fn submit(
        &self,
        submission: SurveySubmission,
    ) -> Result<SurveyResponse, SurveyServiceError> {
        let response = match self.validator.validate(submission) {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "survey submission rejected");
                return Err(err.into());
            }
        };
        let stored = self.store.insert(response).await?;
        info!(
            response_id = %stored.id().0,
            overall = stored.overall_score(),
            "survey response recorded"
        );
        Ok(stored)
    }

    pub async fn overall_summary(&self) -> Result<AggregateSummary, SurveyServiceError> {
        let responses = self.store.fetch_all().await?;
        Ok(AggregateSummary::build(&responses, &self.options))
    }

    pub async fn dimension_scores(
        &self,
        language: Language,
    ) -> Result<Vec<DimensionStatistics>, SurveyServiceError> {
        let responses = self.store.fetch_all().await?;
        Ok(dimension_statistics(&responses, language))
    }

    pub async fn question_performance(
        &self,
        language: Language,
        sort: PerformanceSort,
        limit: Option<usize>,
    ) -> Result<Vec<QuestionPerformance>, SurveyServiceError> {
        let responses = self.store.fetch_all().await?;
        let mut rows = question_performance(&responses, language, sort);
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    pub async fn filtered_analysis(
        &self,
        filter: &AnalysisFilter,
    ) -> Result<AggregateSummary, SurveyServiceError> {
        let responses = match filter.range {
            Some(range) => self
                .store
                .fetch_by_date_range(&range)
                .await?
                .into_iter()
                .filter(|response| filter.criteria.matches(response.demographics()))
                .collect(),
            None => self.store.fetch_by_demographics(&filter.criteria).await?,
        };
        info!(matched = responses.len(), "filtered analysis computed");
        Ok(AggregateSummary::build(&responses, &self.options))
    }

    pub async fn database_stats(
        &self,
        _context: &AdminContext,
    ) -> Result<DatabaseStats, SurveyServiceError> {
        let responses = self.store.fetch_all().await?;
        let active = self
            .store
            .list_questions()
            .await?
            .iter()
            .filter(|question| question.is_active)
            .count();
        Ok(DatabaseStats::collect(&responses, active))
    }

    pub async fn clear(
        &self,
        context: &AdminContext,
        request: &ClearRequest,
    ) -> Result<ClearOutcome, SurveyServiceError> {
        let outcome = clear::clear(self.store.as_ref(), request).await?;
        info!(admin = %context.user.email, count = outcome.count, "clear completed");
        Ok(outcome)
    }

    /// Insert the built-in sample responses in one batch.
    pub async fn seed_samples(
        &self,
        context: &AdminContext,
    ) -> Result<ImportOutcome, SurveyServiceError> {
        let stored = self
            .store
            .insert_batch(sample::sample_responses())
            .await?;
        info!(admin = %context.user.email, count = stored.len(), "sample responses added");
        Ok(ImportOutcome {
            count: stored.len(),
        })
    }

    /// Validate every CSV row first, then insert them in one batch.
    pub async fn import_csv<R: Read>(
        &self,
        context: &AdminContext,
        reader: R,
    ) -> Result<ImportOutcome, SurveyServiceError> {
        let responses = sample::import_responses_csv(reader, &self.validator)?;
        let stored = self.store.insert_batch(responses).await?;
        info!(admin = %context.user.email, count = stored.len(), "responses imported");
        Ok(ImportOutcome {
            count: stored.len(),
        })
    }

    /// Workbook in the context's language.
    pub async fn export_workbook(
        &self,
        context: &AdminContext,
        generated_on: NaiveDate,
    ) -> Result<ExportedFile, SurveyServiceError> {
        let responses = self.store.fetch_all().await?;
        let summary = AggregateSummary::build(&responses, &self.options);
        let report = export::build_report(&summary, &responses, context.language, generated_on)?;
        let bytes = export::write_xlsx(&report)?;
        info!(
            admin = %context.user.email,
            language = context.language.code(),
            responses = responses.len(),
            "report exported"
        );
        Ok(ExportedFile {
            filename: export::report_filename(context.language, generated_on),
            content_type: XLSX_CONTENT_TYPE.to_string(),
            bytes,
        })
    }

    pub async fn export_raw_csv(
        &self,
        context: &AdminContext,
        generated_on: NaiveDate,
    ) -> Result<ExportedFile, SurveyServiceError> {
        let responses = self.store.fetch_all().await?;
        let bytes = export::raw_data_csv(&responses, context.language)?;
        Ok(ExportedFile {
            filename: export::raw_data_filename(generated_on),
            content_type: mime::TEXT_CSV_UTF_8.to_string(),
            bytes,
        })
    }

    /// Active questions in questionnaire order, for the public form.
    pub async fn active_questions(&self) -> Result<Vec<Question>, SurveyServiceError> {
        let mut questions = self.store.list_questions().await?;
        questions.retain(|question| question.is_active);
        Ok(questions)
    }

    pub async fn list_questions(
        &self,
        _context: &AdminContext,
    ) -> Result<Vec<Question>, SurveyServiceError> {
        Ok(self.store.list_questions().await?)
    }

    pub async fn create_question(
        &self,
        context: &AdminContext,
        draft: QuestionDraft,
    ) -> Result<Question, SurveyServiceError> {
        draft.validate()?;
        let question = self.store.create_question(draft).await?;
        info!(admin = %context.user.email, question = %question.id.0, "question created");
        Ok(question)
    }

    pub async fn update_question(
        &self,
        context: &AdminContext,
        id: &QuestionId,
        draft: QuestionDraft,
    ) -> Result<Question, SurveyServiceError> {
        draft.validate()?;
        let question = self.store.update_question(id, draft).await?;
        info!(admin = %context.user.email, question = %id.0, "question updated");
        Ok(question)
    }

    pub async fn set_question_active(
        &self,
        context: &AdminContext,
        id: &QuestionId,
        active: bool,
    ) -> Result<Question, SurveyServiceError> {
        let question = self.store.set_question_active(id, active).await?;
        info!(admin = %context.user.email, question = %id.0, active, "question visibility changed");
        Ok(question)
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, SurveyServiceError> {
        Ok(self.auth.sign_in(credentials).await?)
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), SurveyServiceError> {
        Ok(self.auth.sign_out(access_token).await?)
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), SurveyServiceError> {
        if email.trim().is_empty() {
            return Err(SetupError::MissingEmail.into());
        }
        self.auth.request_password_reset(email.trim()).await?;
        info!("password reset requested");
        Ok(())
    }

    /// Create the administrator account from the setup page.
    pub async fn setup_admin(&self, form: AdminSetupForm) -> Result<AdminUser, SurveyServiceError> {
        let credentials = form.validate()?;
        Ok(self.auth.sign_up(&credentials).await?)
    }

    /// Resolve a bearer token into the context admin operations run under.
    pub async fn authenticate(
        &self,
        access_token: &str,
        language: Language,
    ) -> Result<AdminContext, SurveyServiceError> {
        if access_token.trim().is_empty() {
            return Err(AuthError::Unauthenticated.into());
        }
        let user = self.auth.current_session(access_token).await?;
        Ok(AdminContext { language, user })
    }
}

/// Error raised by the survey service.
#[derive(Debug, thiserror::Error)]
pub enum SurveyServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Selection(#[from] clear::SelectionError),
    #[error(transparent)]
    Clear(#[from] ClearError),
    #[error(transparent)]
    Question(#[from] QuestionDraftError),
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Import(#[from] SampleError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl SurveyServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Intake(_)
            | Self::Selection(_)
            | Self::Clear(ClearError::Unconfirmed)
            | Self::Question(_)
            | Self::Setup(_)
            | Self::Import(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Auth(AuthError::InvalidCredentials | AuthError::Unauthenticated) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Auth(_) => StatusCode::BAD_GATEWAY,
            Self::Store(StoreError::NotFound)
            | Self::Clear(ClearError::Store(StoreError::NotFound)) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Clear(ClearError::Store(_)) => StatusCode::BAD_GATEWAY,
            Self::Export(ExportError::NothingToExport) => StatusCode::NOT_FOUND,
            Self::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
