use async_trait::async_trait;
use chrono::Days;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use super::{
    NewResponseRow, QuestionCatalog, QuestionDraftRow, QuestionRow, ResponseRow, ResponseStore,
    StoreError,
};
use crate::config::StoreConfig;
use crate::survey::clear::{ClearSelection, DateRange, DemographicCriteria};
use crate::survey::domain::DemographicValue;
use crate::survey::questionnaire::{Question, QuestionDraft, QuestionId};
use crate::survey::response::{NewSurveyResponse, SurveyResponse};

type Filters = Vec<(&'static str, String)>;

/// Client for a PostgREST-style hosted store.
#[derive(Clone)]
pub struct RestSurveyStore {
    client: Client,
    config: StoreConfig,
}

impl RestSurveyStore {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: StoreConfig) -> Self {
        Self { client, config }
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.config.base_url, table);
        self.client
            .request(method, url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn fetch_responses(&self, filters: Filters) -> Result<Vec<SurveyResponse>, StoreError> {
        let response = self
            .request(Method::GET, &self.config.responses_table)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .query(&filters)
            .send()
            .await?;
        let rows: Vec<ResponseRow> = read_json(response).await?;
        debug!(rows = rows.len(), "fetched survey responses");
        Ok(rows.into_iter().map(ResponseRow::into_response).collect())
    }

    async fn insert_rows(&self, rows: Vec<NewResponseRow>) -> Result<Vec<SurveyResponse>, StoreError> {
        let response = self
            .request(Method::POST, &self.config.responses_table)
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;
        let stored: Vec<ResponseRow> = read_json(response).await?;
        Ok(stored.into_iter().map(ResponseRow::into_response).collect())
    }

    async fn write_question<B>(
        &self,
        method: Method,
        id: Option<&QuestionId>,
        body: &B,
    ) -> Result<Question, StoreError>
    where
        B: serde::Serialize + Sync,
    {
        let mut request = self
            .request(method, &self.config.questions_table)
            .header("Prefer", "return=representation");
        if let Some(id) = id {
            request = request.query(&[("id", format!("eq.{}", id.0))]);
        }
        let rows: Vec<QuestionRow> = read_json(request.json(body).send().await?).await?;
        rows.into_iter()
            .next()
            .map(Question::from)
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl ResponseStore for RestSurveyStore {
    async fn fetch_all(&self) -> Result<Vec<SurveyResponse>, StoreError> {
        self.fetch_responses(Vec::new()).await
    }

    async fn fetch_by_date_range(
        &self,
        range: &DateRange,
    ) -> Result<Vec<SurveyResponse>, StoreError> {
        self.fetch_responses(date_range_filters(range)).await
    }

    async fn fetch_by_demographics(
        &self,
        criteria: &DemographicCriteria,
    ) -> Result<Vec<SurveyResponse>, StoreError> {
        self.fetch_responses(demographic_filters(criteria)).await
    }

    async fn insert(&self, response: NewSurveyResponse) -> Result<SurveyResponse, StoreError> {
        self.insert_rows(vec![NewResponseRow::from(&response)])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))
    }

    async fn insert_batch(
        &self,
        responses: Vec<NewSurveyResponse>,
    ) -> Result<Vec<SurveyResponse>, StoreError> {
        if responses.is_empty() {
            return Ok(Vec::new());
        }
        self.insert_rows(responses.iter().map(NewResponseRow::from).collect())
            .await
    }

    async fn delete_matching(&self, selection: &ClearSelection) -> Result<usize, StoreError> {
        let filters = match selection {
            // The store refuses unfiltered deletes.
            ClearSelection::All => vec![("id", "not.is.null".to_string())],
            ClearSelection::DateRange(range) => date_range_filters(range),
            ClearSelection::Demographics(filter) => demographic_filters(filter.criteria()),
        };

        let response = self
            .request(Method::DELETE, &self.config.responses_table)
            .header("Prefer", "return=representation")
            .query(&[("select", "id")])
            .query(&filters)
            .send()
            .await?;
        let deleted: Vec<serde_json::Value> = read_json(response).await?;
        Ok(deleted.len())
    }
}

#[async_trait]
impl QuestionCatalog for RestSurveyStore {
    async fn list_questions(&self) -> Result<Vec<Question>, StoreError> {
        let response = self
            .request(Method::GET, &self.config.questions_table)
            .query(&[("select", "*"), ("order", "order_number.asc")])
            .send()
            .await?;
        let rows: Vec<QuestionRow> = read_json(response).await?;
        Ok(rows.into_iter().map(Question::from).collect())
    }

    async fn create_question(&self, draft: QuestionDraft) -> Result<Question, StoreError> {
        let mut row = QuestionDraftRow::from(&draft);
        row.is_active = Some(true);
        self.write_question(Method::POST, None, &row).await
    }

    async fn update_question(
        &self,
        id: &QuestionId,
        draft: QuestionDraft,
    ) -> Result<Question, StoreError> {
        let row = QuestionDraftRow::from(&draft);
        self.write_question(Method::PATCH, Some(id), &row).await
    }

    async fn set_question_active(
        &self,
        id: &QuestionId,
        active: bool,
    ) -> Result<Question, StoreError> {
        self.write_question(Method::PATCH, Some(id), &json!({ "is_active": active }))
            .await
    }
}

/// `created_at` bounds covering whole UTC days, upper bound exclusive.
fn date_range_filters(range: &DateRange) -> Filters {
    let lower = ("created_at", format!("gte.{}T00:00:00Z", range.from()));
    let upper = match range.to().checked_add_days(Days::new(1)) {
        Some(next) => ("created_at", format!("lt.{next}T00:00:00Z")),
        None => ("created_at", format!("lte.{}T23:59:59.999999Z", range.to())),
    };
    vec![lower, upper]
}

fn demographic_filters(criteria: &DemographicCriteria) -> Filters {
    let mut filters = Vec::new();
    if let Some(value) = criteria.gender {
        filters.push(equals(value));
    }
    if let Some(value) = criteria.age {
        filters.push(equals(value));
    }
    if let Some(value) = criteria.marital_status {
        filters.push(equals(value));
    }
    if let Some(value) = criteria.education_level {
        filters.push(equals(value));
    }
    filters
}

fn equals<T: DemographicValue>(value: T) -> (&'static str, String) {
    (T::FIELD, format!("eq.{}", value.as_str()))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "record store rejected request");
        return Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}
