use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::auth::{AdminContext, AdminSetupForm, AuthError, AuthGateway, Credentials};
use super::clear::{
    ClearError, ClearRequest, ClearRequestPayload, DateRange, DemographicCriteria,
};
use super::domain::{AgeGroup, EducationLevel, Gender, Language, MaritalStatus};
use super::intake::SurveySubmission;
use super::questionnaire::{QuestionDraft, QuestionId};
use super::service::{AnalysisFilter, ExportedFile, SurveyService, SurveyServiceError};
use super::store::SurveyStore;
use super::summary::PerformanceSort;

type SharedService<S, A> = Arc<SurveyService<S, A>>;

/// Router exposing the public survey, dashboard, admin, and auth endpoints.
pub fn survey_router<S, A>(service: SharedService<S, A>) -> Router
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    Router::new()
        .route("/api/v1/responses", post(submit_handler::<S, A>))
        .route("/api/v1/questions", get(active_questions_handler::<S, A>))
        .route(
            "/api/v1/data/overall_summary",
            get(overall_summary_handler::<S, A>),
        )
        .route(
            "/api/v1/data/dimension_scores",
            get(dimension_scores_handler::<S, A>),
        )
        .route(
            "/api/v1/data/question_performance",
            get(question_performance_handler::<S, A>),
        )
        .route(
            "/api/v1/data/filtered_analysis",
            get(filtered_analysis_handler::<S, A>),
        )
        .route("/api/v1/admin/stats", get(stats_handler::<S, A>))
        .route("/api/v1/admin/clear", post(clear_handler::<S, A>))
        .route("/api/v1/admin/seed", post(seed_handler::<S, A>))
        .route("/api/v1/admin/export", get(export_handler::<S, A>))
        .route(
            "/api/v1/admin/export/raw.csv",
            get(raw_export_handler::<S, A>),
        )
        .route(
            "/api/v1/admin/questions",
            get(list_questions_handler::<S, A>).post(create_question_handler::<S, A>),
        )
        .route(
            "/api/v1/admin/questions/:question_id",
            put(update_question_handler::<S, A>),
        )
        .route(
            "/api/v1/admin/questions/:question_id/active",
            post(question_active_handler::<S, A>),
        )
        .route("/api/v1/auth/sign_in", post(sign_in_handler::<S, A>))
        .route("/api/v1/auth/sign_out", post(sign_out_handler::<S, A>))
        .route(
            "/api/v1/auth/password_reset",
            post(password_reset_handler::<S, A>),
        )
        .route("/api/v1/auth/setup", post(setup_handler::<S, A>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LanguageQuery {
    #[serde(default)]
    language: Language,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PerformanceQuery {
    #[serde(default)]
    language: Language,
    #[serde(default)]
    sort: PerformanceSort,
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AnalysisQuery {
    gender: Option<Gender>,
    age: Option<AgeGroup>,
    marital_status: Option<MaritalStatus>,
    education_level: Option<EducationLevel>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PasswordResetRequest {
    email: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActiveFlag {
    active: bool,
}

pub(crate) async fn submit_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    Json(submission): Json<SurveySubmission>,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    match service.submit(submission).await {
        Ok(stored) => (StatusCode::CREATED, Json(stored)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn active_questions_handler<S, A>(
    State(service): State<SharedService<S, A>>,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    respond(service.active_questions().await)
}

pub(crate) async fn overall_summary_handler<S, A>(
    State(service): State<SharedService<S, A>>,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    respond(service.overall_summary().await)
}

pub(crate) async fn dimension_scores_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    Query(query): Query<LanguageQuery>,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    respond(service.dimension_scores(query.language).await)
}

pub(crate) async fn question_performance_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    Query(query): Query<PerformanceQuery>,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    respond(
        service
            .question_performance(query.language, query.sort, query.limit)
            .await,
    )
}

pub(crate) async fn filtered_analysis_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    Query(query): Query<AnalysisQuery>,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let range = match DateRange::from_bounds(query.date_from, query.date_to) {
        Ok(range) => range,
        Err(err) => return error_response(err.into()),
    };
    let filter = AnalysisFilter {
        criteria: DemographicCriteria {
            gender: query.gender,
            age: query.age,
            marital_status: query.marital_status,
            education_level: query.education_level,
        },
        range,
    };
    respond(service.filtered_analysis(&filter).await)
}

pub(crate) async fn stats_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    headers: HeaderMap,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let context = match admin_context(&service, &headers, Language::default()).await {
        Ok(context) => context,
        Err(response) => return response,
    };
    respond(service.database_stats(&context).await)
}

pub(crate) async fn clear_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    headers: HeaderMap,
    Json(payload): Json<ClearRequestPayload>,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let request = match ClearRequest::try_from(payload) {
        Ok(request) => request,
        Err(err) => return error_response(err.into()),
    };
    if !request.is_confirmed() {
        return error_response(ClearError::Unconfirmed.into());
    }
    let context = match admin_context(&service, &headers, Language::default()).await {
        Ok(context) => context,
        Err(response) => return response,
    };
    respond(service.clear(&context, &request).await)
}

/// An empty body seeds the built-in samples; a CSV body is imported.
pub(crate) async fn seed_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let context = match admin_context(&service, &headers, Language::default()).await {
        Ok(context) => context,
        Err(response) => return response,
    };
    let outcome = if body.is_empty() {
        service.seed_samples(&context).await
    } else {
        service.import_csv(&context, body.as_ref()).await
    };
    match outcome {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn export_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    headers: HeaderMap,
    Query(query): Query<LanguageQuery>,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let context = match admin_context(&service, &headers, query.language).await {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service
        .export_workbook(&context, Utc::now().date_naive())
        .await
    {
        Ok(file) => download(file),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn raw_export_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    headers: HeaderMap,
    Query(query): Query<LanguageQuery>,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let context = match admin_context(&service, &headers, query.language).await {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.export_raw_csv(&context, Utc::now().date_naive()).await {
        Ok(file) => download(file),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_questions_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    headers: HeaderMap,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let context = match admin_context(&service, &headers, Language::default()).await {
        Ok(context) => context,
        Err(response) => return response,
    };
    respond(service.list_questions(&context).await)
}

pub(crate) async fn create_question_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    headers: HeaderMap,
    Json(draft): Json<QuestionDraft>,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let context = match admin_context(&service, &headers, Language::default()).await {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.create_question(&context, draft).await {
        Ok(question) => (StatusCode::CREATED, Json(question)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_question_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    headers: HeaderMap,
    Path(question_id): Path<String>,
    Json(draft): Json<QuestionDraft>,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let context = match admin_context(&service, &headers, Language::default()).await {
        Ok(context) => context,
        Err(response) => return response,
    };
    respond(
        service
            .update_question(&context, &QuestionId(question_id), draft)
            .await,
    )
}

pub(crate) async fn question_active_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    headers: HeaderMap,
    Path(question_id): Path<String>,
    Json(flag): Json<ActiveFlag>,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let context = match admin_context(&service, &headers, Language::default()).await {
        Ok(context) => context,
        Err(response) => return response,
    };
    respond(
        service
            .set_question_active(&context, &QuestionId(question_id), flag.active)
            .await,
    )
}

pub(crate) async fn sign_in_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    Json(credentials): Json<Credentials>,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    respond(service.sign_in(&credentials).await)
}

pub(crate) async fn sign_out_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    headers: HeaderMap,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let Some(token) = bearer_token(&headers) else {
        return error_response(AuthError::Unauthenticated.into());
    };
    match service.sign_out(token).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn password_reset_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    Json(request): Json<PasswordResetRequest>,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    match service.request_password_reset(&request.email).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn setup_handler<S, A>(
    State(service): State<SharedService<S, A>>,
    Json(form): Json<AdminSetupForm>,
) -> Response
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    match service.setup_admin(form).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn admin_context<S, A>(
    service: &SurveyService<S, A>,
    headers: &HeaderMap,
    language: Language,
) -> Result<AdminContext, Response>
where
    S: SurveyStore + 'static,
    A: AuthGateway + 'static,
{
    let token = bearer_token(headers).unwrap_or_default();
    service
        .authenticate(token, language)
        .await
        .map_err(error_response)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn respond<T: serde::Serialize>(result: Result<T, SurveyServiceError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn error_response(err: SurveyServiceError) -> Response {
    let status = err.status();
    if status.is_server_error() {
        tracing::error!(error = %err, "survey request failed");
    }
    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}

fn download(file: ExportedFile) -> Response {
    let content_type = HeaderValue::from_str(&file.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&content_disposition(&file.filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response()
}

/// Attachment header with an ASCII fallback name and the UTF-8 name encoded
/// per RFC 5987, so Amharic filenames survive.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded = urlencoding::encode(filename);
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
