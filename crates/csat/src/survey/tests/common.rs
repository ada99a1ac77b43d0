use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::SurveyConfig;
use crate::survey::auth::{AdminContext, AdminUser, AuthError, AuthGateway, Credentials, Session};
use crate::survey::clear::{ClearSelection, DateRange, DemographicCriteria};
use crate::survey::domain::{
    AgeGroup, Demographics, EducationLevel, Gender, Language, MaritalStatus,
};
use crate::survey::intake::{DemographicAnswers, SurveySubmission};
use crate::survey::questionnaire::{
    standard_catalog, ItemKey, Question, QuestionDraft, QuestionId,
};
use crate::survey::response::{NewSurveyResponse, ResponseId, SurveyResponse};
use crate::survey::service::SurveyService;
use crate::survey::store::{QuestionCatalog, ResponseStore, StoreError};
use crate::survey::survey_router;

pub(super) const ADMIN_EMAIL: &str = "admin@example.org";
pub(super) const ADMIN_PASSWORD: &str = "s3cret-pass";
pub(super) const ADMIN_TOKEN: &str = "token-admin";

pub(super) fn demographics() -> Demographics {
    Demographics {
        gender: Gender::Female,
        age: AgeGroup::From31To40,
        marital_status: MaritalStatus::Married,
        education_level: EducationLevel::FirstDegree,
    }
}

/// Every item rated `rating`.
pub(super) fn submission(rating: i64) -> SurveySubmission {
    SurveySubmission::from_ratings(
        DemographicAnswers::from(demographics()),
        ItemKey::ordered().into_iter().map(|item| (item, rating)),
    )
}

pub(super) fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn admin_context(language: Language) -> AdminContext {
    AdminContext {
        language,
        user: AdminUser {
            id: "admin-1".to_string(),
            email: ADMIN_EMAIL.to_string(),
        },
    }
}

pub(super) fn build_service() -> (
    SurveyService<MemoryStore, FakeAuth>,
    Arc<MemoryStore>,
    Arc<FakeAuth>,
) {
    let store = Arc::new(MemoryStore::default());
    let auth = Arc::new(FakeAuth::default());
    let service = SurveyService::new(store.clone(), auth.clone(), &SurveyConfig::default());
    (service, store, auth)
}

pub(super) fn router_with_service(
    service: SurveyService<MemoryStore, FakeAuth>,
) -> axum::Router {
    survey_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Clone)]
pub(super) struct MemoryStore {
    responses: Arc<Mutex<Vec<SurveyResponse>>>,
    questions: Arc<Mutex<Vec<Question>>>,
    next_id: Arc<Mutex<u64>>,
    now: DateTime<Utc>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            questions: Arc::new(Mutex::new(standard_catalog())),
            next_id: Arc::new(Mutex::new(0)),
            now: at(20, 12),
        }
    }
}

impl MemoryStore {
    pub(super) fn responses(&self) -> Vec<SurveyResponse> {
        self.responses.lock().expect("store mutex poisoned").clone()
    }

    /// Insert a response stamped at `created_at`.
    pub(super) fn seed(&self, rating: i64, gender: Gender, created_at: DateTime<Utc>) {
        let mut demographics = demographics();
        demographics.gender = gender;
        let id = self.allocate_id();
        let response = NewSurveyResponse {
            demographics,
            item_scores: crate::survey::questionnaire::ItemScores::from_recorded(
                ItemKey::ordered().into_iter().map(|item| (item, rating)),
            ),
            recorded_at: Some(created_at),
        }
        .into_response(id, created_at);
        self.responses
            .lock()
            .expect("store mutex poisoned")
            .push(response);
    }

    fn allocate_id(&self) -> ResponseId {
        let mut next = self.next_id.lock().expect("id mutex poisoned");
        *next += 1;
        ResponseId(format!("resp-{next}"))
    }
}

#[async_trait]
impl ResponseStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<SurveyResponse>, StoreError> {
        Ok(self.responses())
    }

    async fn fetch_by_date_range(
        &self,
        range: &DateRange,
    ) -> Result<Vec<SurveyResponse>, StoreError> {
        Ok(self
            .responses()
            .into_iter()
            .filter(|response| range.contains(response))
            .collect())
    }

    async fn fetch_by_demographics(
        &self,
        criteria: &DemographicCriteria,
    ) -> Result<Vec<SurveyResponse>, StoreError> {
        Ok(self
            .responses()
            .into_iter()
            .filter(|response| criteria.matches(response.demographics()))
            .collect())
    }

    async fn insert(&self, response: NewSurveyResponse) -> Result<SurveyResponse, StoreError> {
        let stored = response.into_response(self.allocate_id(), self.now);
        self.responses
            .lock()
            .expect("store mutex poisoned")
            .push(stored.clone());
        Ok(stored)
    }

    async fn insert_batch(
        &self,
        responses: Vec<NewSurveyResponse>,
    ) -> Result<Vec<SurveyResponse>, StoreError> {
        let stored: Vec<SurveyResponse> = responses
            .into_iter()
            .map(|response| response.into_response(self.allocate_id(), self.now))
            .collect();
        self.responses
            .lock()
            .expect("store mutex poisoned")
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn delete_matching(&self, selection: &ClearSelection) -> Result<usize, StoreError> {
        let mut guard = self.responses.lock().expect("store mutex poisoned");
        let before = guard.len();
        guard.retain(|response| !selection.matches(response));
        Ok(before - guard.len())
    }
}

#[async_trait]
impl QuestionCatalog for MemoryStore {
    async fn list_questions(&self) -> Result<Vec<Question>, StoreError> {
        let mut questions = self.questions.lock().expect("catalog mutex poisoned").clone();
        questions.sort_by_key(|question| question.order_number);
        Ok(questions)
    }

    async fn create_question(&self, draft: QuestionDraft) -> Result<Question, StoreError> {
        let mut guard = self.questions.lock().expect("catalog mutex poisoned");
        let question = Question {
            id: QuestionId(format!("custom-{}", guard.len() + 1)),
            dimension: draft.dimension,
            text_amharic: draft.text_amharic,
            text_english: draft.text_english,
            is_active: true,
            order_number: draft.order_number,
        };
        guard.push(question.clone());
        Ok(question)
    }

    async fn update_question(
        &self,
        id: &QuestionId,
        draft: QuestionDraft,
    ) -> Result<Question, StoreError> {
        let mut guard = self.questions.lock().expect("catalog mutex poisoned");
        let question = guard
            .iter_mut()
            .find(|question| &question.id == id)
            .ok_or(StoreError::NotFound)?;
        question.dimension = draft.dimension;
        question.text_amharic = draft.text_amharic;
        question.text_english = draft.text_english;
        question.order_number = draft.order_number;
        Ok(question.clone())
    }

    async fn set_question_active(
        &self,
        id: &QuestionId,
        active: bool,
    ) -> Result<Question, StoreError> {
        let mut guard = self.questions.lock().expect("catalog mutex poisoned");
        let question = guard
            .iter_mut()
            .find(|question| &question.id == id)
            .ok_or(StoreError::NotFound)?;
        question.is_active = active;
        Ok(question.clone())
    }
}

/// Store whose backend is unreachable.
pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, StoreError> {
    Err(StoreError::Transport("connection refused".to_string()))
}

#[async_trait]
impl ResponseStore for UnavailableStore {
    async fn fetch_all(&self) -> Result<Vec<SurveyResponse>, StoreError> {
        offline()
    }

    async fn fetch_by_date_range(
        &self,
        _range: &DateRange,
    ) -> Result<Vec<SurveyResponse>, StoreError> {
        offline()
    }

    async fn fetch_by_demographics(
        &self,
        _criteria: &DemographicCriteria,
    ) -> Result<Vec<SurveyResponse>, StoreError> {
        offline()
    }

    async fn insert(&self, _response: NewSurveyResponse) -> Result<SurveyResponse, StoreError> {
        offline()
    }

    async fn insert_batch(
        &self,
        _responses: Vec<NewSurveyResponse>,
    ) -> Result<Vec<SurveyResponse>, StoreError> {
        offline()
    }

    async fn delete_matching(&self, _selection: &ClearSelection) -> Result<usize, StoreError> {
        offline()
    }
}

#[async_trait]
impl QuestionCatalog for UnavailableStore {
    async fn list_questions(&self) -> Result<Vec<Question>, StoreError> {
        offline()
    }

    async fn create_question(&self, _draft: QuestionDraft) -> Result<Question, StoreError> {
        offline()
    }

    async fn update_question(
        &self,
        _id: &QuestionId,
        _draft: QuestionDraft,
    ) -> Result<Question, StoreError> {
        offline()
    }

    async fn set_question_active(
        &self,
        _id: &QuestionId,
        _active: bool,
    ) -> Result<Question, StoreError> {
        offline()
    }
}

/// Gateway with one known administrator and token.
#[derive(Clone)]
pub(super) struct FakeAuth {
    users: Arc<Mutex<BTreeMap<String, String>>>,
    tokens: Arc<Mutex<HashMap<String, AdminUser>>>,
    reset_requests: Arc<Mutex<Vec<String>>>,
}

impl Default for FakeAuth {
    fn default() -> Self {
        let mut users = BTreeMap::new();
        users.insert(ADMIN_EMAIL.to_string(), ADMIN_PASSWORD.to_string());
        let mut tokens = HashMap::new();
        tokens.insert(ADMIN_TOKEN.to_string(), admin_context(Language::En).user);
        Self {
            users: Arc::new(Mutex::new(users)),
            tokens: Arc::new(Mutex::new(tokens)),
            reset_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeAuth {
    pub(super) fn reset_requests(&self) -> Vec<String> {
        self.reset_requests
            .lock()
            .expect("auth mutex poisoned")
            .clone()
    }

    pub(super) fn has_token(&self, token: &str) -> bool {
        self.tokens
            .lock()
            .expect("auth mutex poisoned")
            .contains_key(token)
    }
}

#[async_trait]
impl AuthGateway for FakeAuth {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let users = self.users.lock().expect("auth mutex poisoned");
        match users.get(&credentials.email) {
            Some(password) if *password == credentials.password => {
                let user = AdminUser {
                    id: format!("user-{}", credentials.email),
                    email: credentials.email.clone(),
                };
                let token = format!("token-{}", credentials.email);
                self.tokens
                    .lock()
                    .expect("auth mutex poisoned")
                    .insert(token.clone(), user.clone());
                Ok(Session {
                    access_token: token,
                    expires_at: None,
                    user,
                })
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.tokens
            .lock()
            .expect("auth mutex poisoned")
            .remove(access_token);
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.reset_requests
            .lock()
            .expect("auth mutex poisoned")
            .push(email.to_string());
        Ok(())
    }

    async fn current_session(&self, access_token: &str) -> Result<AdminUser, AuthError> {
        self.tokens
            .lock()
            .expect("auth mutex poisoned")
            .get(access_token)
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<AdminUser, AuthError> {
        let mut users = self.users.lock().expect("auth mutex poisoned");
        if users.contains_key(&credentials.email) {
            return Err(AuthError::Rejected {
                status: 422,
                message: "user already registered".to_string(),
            });
        }
        users.insert(credentials.email.clone(), credentials.password.clone());
        Ok(AdminUser {
            id: format!("user-{}", credentials.email),
            email: credentials.email.clone(),
        })
    }
}
