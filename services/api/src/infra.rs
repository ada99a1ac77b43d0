use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use csat::config::{AppConfig, SurveyConfig};
use csat::survey::{
    standard_catalog, AdminUser, AuthError, AuthGateway, ClearSelection, Credentials, DateRange,
    DemographicCriteria, DemographicValue, Language, NewSurveyResponse, Question,
    QuestionCatalog, QuestionDraft, QuestionId, ResponseId, ResponseStore, RestAuthGateway,
    RestSurveyStore, Session, StoreError, SurveyResponse, SurveyService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type HostedService = SurveyService<RestSurveyStore, RestAuthGateway>;
pub(crate) type LocalService = SurveyService<InMemorySurveyStore, InMemoryAuthGateway>;

/// The service wired to the hosted record store when one is configured, or
/// to process-local backends otherwise.
pub(crate) enum Backend {
    Hosted(Arc<HostedService>),
    Local(Arc<LocalService>),
}

impl Backend {
    pub(crate) fn from_config(config: &AppConfig) -> Self {
        match &config.store {
            Some(store) => {
                info!(base_url = %store.base_url, "using hosted record store");
                Backend::Hosted(Arc::new(SurveyService::new(
                    Arc::new(RestSurveyStore::new(store.clone())),
                    Arc::new(RestAuthGateway::new(store)),
                    &config.survey,
                )))
            }
            None => {
                info!("CSAT_STORE_URL not set; using in-memory record store");
                Backend::Local(Arc::new(local_service(&config.survey)))
            }
        }
    }
}

pub(crate) fn local_service(config: &SurveyConfig) -> LocalService {
    SurveyService::new(
        Arc::new(InMemorySurveyStore::default()),
        Arc::new(InMemoryAuthGateway::from_env()),
        config,
    )
}

#[derive(Clone)]
pub(crate) struct InMemorySurveyStore {
    responses: Arc<Mutex<Vec<SurveyResponse>>>,
    questions: Arc<Mutex<Vec<Question>>>,
}

impl Default for InMemorySurveyStore {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            questions: Arc::new(Mutex::new(standard_catalog())),
        }
    }
}

impl InMemorySurveyStore {
    fn snapshot(&self) -> Vec<SurveyResponse> {
        self.responses
            .lock()
            .expect("response store mutex poisoned")
            .clone()
    }

    fn stamp(response: NewSurveyResponse) -> SurveyResponse {
        response.into_response(ResponseId(Uuid::new_v4().to_string()), Utc::now())
    }

    fn with_question<F>(&self, id: &QuestionId, update: F) -> Result<Question, StoreError>
    where
        F: FnOnce(&mut Question),
    {
        let mut guard = self.questions.lock().expect("question catalog mutex poisoned");
        let question = guard
            .iter_mut()
            .find(|question| &question.id == id)
            .ok_or(StoreError::NotFound)?;
        update(question);
        Ok(question.clone())
    }
}

#[async_trait]
impl ResponseStore for InMemorySurveyStore {
    async fn fetch_all(&self) -> Result<Vec<SurveyResponse>, StoreError> {
        Ok(self.snapshot())
    }

    async fn fetch_by_date_range(
        &self,
        range: &DateRange,
    ) -> Result<Vec<SurveyResponse>, StoreError> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|response| range.contains(response))
            .collect())
    }

    async fn fetch_by_demographics(
        &self,
        criteria: &DemographicCriteria,
    ) -> Result<Vec<SurveyResponse>, StoreError> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|response| criteria.matches(response.demographics()))
            .collect())
    }

    async fn insert(&self, response: NewSurveyResponse) -> Result<SurveyResponse, StoreError> {
        let stored = Self::stamp(response);
        self.responses
            .lock()
            .expect("response store mutex poisoned")
            .push(stored.clone());
        Ok(stored)
    }

    async fn insert_batch(
        &self,
        responses: Vec<NewSurveyResponse>,
    ) -> Result<Vec<SurveyResponse>, StoreError> {
        let stored: Vec<SurveyResponse> = responses.into_iter().map(Self::stamp).collect();
        self.responses
            .lock()
            .expect("response store mutex poisoned")
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn delete_matching(&self, selection: &ClearSelection) -> Result<usize, StoreError> {
        let mut guard = self.responses.lock().expect("response store mutex poisoned");
        let before = guard.len();
        guard.retain(|response| !selection.matches(response));
        Ok(before - guard.len())
    }
}

#[async_trait]
impl QuestionCatalog for InMemorySurveyStore {
    async fn list_questions(&self) -> Result<Vec<Question>, StoreError> {
        let mut questions = self
            .questions
            .lock()
            .expect("question catalog mutex poisoned")
            .clone();
        questions.sort_by_key(|question| question.order_number);
        Ok(questions)
    }

    async fn create_question(&self, draft: QuestionDraft) -> Result<Question, StoreError> {
        let question = Question {
            id: QuestionId(Uuid::new_v4().to_string()),
            dimension: draft.dimension,
            text_amharic: draft.text_amharic,
            text_english: draft.text_english,
            is_active: true,
            order_number: draft.order_number,
        };
        self.questions
            .lock()
            .expect("question catalog mutex poisoned")
            .push(question.clone());
        Ok(question)
    }

    async fn update_question(
        &self,
        id: &QuestionId,
        draft: QuestionDraft,
    ) -> Result<Question, StoreError> {
        self.with_question(id, |question| {
            question.dimension = draft.dimension;
            question.text_amharic = draft.text_amharic;
            question.text_english = draft.text_english;
            question.order_number = draft.order_number;
        })
    }

    async fn set_question_active(
        &self,
        id: &QuestionId,
        active: bool,
    ) -> Result<Question, StoreError> {
        self.with_question(id, |question| question.is_active = active)
    }
}

/// Development gateway. Holds at most the accounts created in this process,
/// plus the admin named by `CSAT_ADMIN_EMAIL`/`CSAT_ADMIN_PASSWORD`.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAuthGateway {
    accounts: Arc<Mutex<HashMap<String, (AdminUser, String)>>>,
    sessions: Arc<Mutex<HashMap<String, AdminUser>>>,
}

impl InMemoryAuthGateway {
    pub(crate) fn from_env() -> Self {
        let gateway = Self::default();
        let email = std::env::var("CSAT_ADMIN_EMAIL").ok();
        let password = std::env::var("CSAT_ADMIN_PASSWORD").ok();
        if let (Some(email), Some(password)) = (email, password) {
            gateway.register(&Credentials { email, password });
        }
        gateway
    }

    pub(crate) fn register(&self, credentials: &Credentials) -> AdminUser {
        let user = AdminUser {
            id: Uuid::new_v4().to_string(),
            email: credentials.email.trim().to_string(),
        };
        self.accounts
            .lock()
            .expect("account mutex poisoned")
            .insert(user.email.clone(), (user.clone(), credentials.password.clone()));
        user
    }
}

#[async_trait]
impl AuthGateway for InMemoryAuthGateway {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let user = {
            let accounts = self.accounts.lock().expect("account mutex poisoned");
            match accounts.get(credentials.email.trim()) {
                Some((user, password)) if *password == credentials.password => user.clone(),
                _ => return Err(AuthError::InvalidCredentials),
            }
        };
        let access_token = Uuid::new_v4().to_string();
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .insert(access_token.clone(), user.clone());
        Ok(Session {
            access_token,
            expires_at: None,
            user,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .remove(access_token);
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let known = self
            .accounts
            .lock()
            .expect("account mutex poisoned")
            .contains_key(email);
        info!(known, "in-memory gateway sends no reset email");
        Ok(())
    }

    async fn current_session(&self, access_token: &str) -> Result<AdminUser, AuthError> {
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .get(access_token)
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<AdminUser, AuthError> {
        let exists = self
            .accounts
            .lock()
            .expect("account mutex poisoned")
            .contains_key(credentials.email.trim());
        if exists {
            return Err(AuthError::Rejected {
                status: 422,
                message: "user already registered".to_string(),
            });
        }
        Ok(self.register(credentials))
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_language(raw: &str) -> Result<Language, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "en" | "english" => Ok(Language::En),
        "am" | "amharic" => Ok(Language::Am),
        other => Err(format!("unsupported language '{other}' (expected en or am)")),
    }
}

/// Parse a demographic value by its stored spelling, e.g. `female` or `50+`.
pub(crate) fn parse_demographic<T: DemographicValue>(raw: &str) -> Result<T, String> {
    let raw = raw.trim();
    T::ordered()
        .iter()
        .copied()
        .find(|value| value.as_str().eq_ignore_ascii_case(raw))
        .ok_or_else(|| {
            let allowed: Vec<&str> = T::ordered().iter().map(|value| value.as_str()).collect();
            format!("'{raw}' is not a valid {} ({})", T::FIELD, allowed.join(", "))
        })
}
