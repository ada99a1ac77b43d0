//! End-to-end scenarios for survey intake, the dashboard aggregates, and
//! administrator data management, driven through the public crate surface.

mod common {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};

    use csat::survey::{
        ClearSelection, DateRange, DemographicCriteria, NewSurveyResponse, ResponseId,
        ResponseStore, StoreError, SurveyResponse,
    };

    pub(super) fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, day, 10, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    /// Response-only store; ids are sequential and `now` stamps new rows.
    #[derive(Default, Clone)]
    pub(super) struct MemoryResponses {
        rows: Arc<Mutex<Vec<SurveyResponse>>>,
    }

    impl MemoryResponses {
        pub(super) fn rows(&self) -> Vec<SurveyResponse> {
            self.rows.lock().expect("store mutex poisoned").clone()
        }

        fn stamp(&self, response: NewSurveyResponse) -> SurveyResponse {
            let mut rows = self.rows.lock().expect("store mutex poisoned");
            let stored = response.into_response(ResponseId(format!("r{}", rows.len() + 1)), at(28));
            rows.push(stored.clone());
            stored
        }
    }

    #[async_trait]
    impl ResponseStore for MemoryResponses {
        async fn fetch_all(&self) -> Result<Vec<SurveyResponse>, StoreError> {
            Ok(self.rows())
        }

        async fn fetch_by_date_range(
            &self,
            range: &DateRange,
        ) -> Result<Vec<SurveyResponse>, StoreError> {
            Ok(self.rows().into_iter().filter(|r| range.contains(r)).collect())
        }

        async fn fetch_by_demographics(
            &self,
            criteria: &DemographicCriteria,
        ) -> Result<Vec<SurveyResponse>, StoreError> {
            Ok(self
                .rows()
                .into_iter()
                .filter(|r| criteria.matches(r.demographics()))
                .collect())
        }

        async fn insert(&self, response: NewSurveyResponse) -> Result<SurveyResponse, StoreError> {
            Ok(self.stamp(response))
        }

        async fn insert_batch(
            &self,
            responses: Vec<NewSurveyResponse>,
        ) -> Result<Vec<SurveyResponse>, StoreError> {
            Ok(responses.into_iter().map(|r| self.stamp(r)).collect())
        }

        async fn delete_matching(&self, selection: &ClearSelection) -> Result<usize, StoreError> {
            let mut rows = self.rows.lock().expect("store mutex poisoned");
            let before = rows.len();
            rows.retain(|r| !selection.matches(r));
            Ok(before - rows.len())
        }
    }
}

use chrono::NaiveDate;
use csat::survey::clear::{self, ClearRequest, ClearSelection, DateRange, DemographicFilter};
use csat::survey::export::{build_report, raw_data_csv, write_xlsx};
use csat::survey::{
    import_responses_csv, sample_responses, AggregateSummary, DemographicCriteria,
    DemographicValue, Dimension, EducationLevel, Gender, IntakeValidator, Language,
    ResponseStore, SummaryOptions,
};

use common::*;

const CSV: &str = "\
gender,age,marital_status,education_level,created_at,q1_facilities,q2_equipment,q3_materials,q4_prompt_service,q5_willingness,q6_availability,q7_promised_time,q8_problem_solving,q9_dependable,q10_competence,q11_courtesy,q12_confidence,q13_individual_attention,q14_understanding,q15_best_interests
male,18-30,single,diploma,2024-02-01,5,5,5,5,5,5,5,5,5,5,5,5,5,5,5
female,31-40,married,first_degree,2024-02-05,3,3,3,3,3,3,3,3,3,3,3,3,3,3,3
female,50+,widowed,1-8,2024-02-10,1,2,3,1,2,3,1,2,3,1,2,3,1,2,3
";

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, day).expect("valid date")
}

async fn imported_store() -> MemoryResponses {
    let store = MemoryResponses::default();
    let rows = import_responses_csv(CSV.as_bytes(), &IntakeValidator::default())
        .expect("csv imports");
    store.insert_batch(rows).await.expect("batch insert");
    store
}

#[tokio::test]
async fn imported_responses_feed_the_dashboard_summary() {
    let store = imported_store().await;
    let responses = store.fetch_all().await.expect("fetch");

    let summary = AggregateSummary::build(
        &responses,
        &SummaryOptions {
            expected_population: Some(12),
            recent_limit: 2,
        },
    );

    assert_eq!(summary.total_responses, 3);
    assert!((summary.overall_csat - (5.0 + 3.0 + 2.0) / 3.0).abs() < 1e-9);
    assert!((summary.dimension_scores.get(Dimension::Empathy) - 10.0 / 3.0).abs() < 1e-9);
    assert!((summary.response_rate - 0.25).abs() < 1e-9);
    assert_eq!(summary.demographic_counts.gender.get(Gender::Female), 2);
    assert_eq!(
        summary
            .demographic_counts
            .education_level
            .get(EducationLevel::Grades1To8),
        1
    );
    assert_eq!(summary.recent_responses.len(), 2);
    assert_eq!(summary.recent_responses[0].created_at().date_naive(), date(10));
}

#[tokio::test]
async fn demographic_clear_leaves_other_groups() {
    let store = imported_store().await;
    let filter = DemographicFilter::new(DemographicCriteria {
        gender: Some(Gender::Female),
        ..DemographicCriteria::default()
    })
    .expect("non-empty filter");

    let outcome = clear::clear(
        &store,
        &ClearRequest::new(ClearSelection::Demographics(filter), "DELETE"),
    )
    .await
    .expect("clear succeeds");

    assert_eq!(outcome.count, 2);
    let remaining = store.rows();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].demographics().gender.as_str(), "male");
}

#[tokio::test]
async fn date_range_clear_is_inclusive_of_both_days() {
    let store = imported_store().await;
    let range = DateRange::new(date(1), date(5)).expect("ordered range");

    let outcome = clear::clear(
        &store,
        &ClearRequest::new(ClearSelection::DateRange(range), "DELETE"),
    )
    .await
    .expect("clear succeeds");

    assert_eq!(outcome.count, 2);
    assert_eq!(store.rows().len(), 1);
}

#[tokio::test]
async fn unconfirmed_clear_touches_nothing() {
    let store = imported_store().await;

    let result = clear::clear(&store, &ClearRequest::new(ClearSelection::All, "DELETE ")).await;

    assert!(result.is_err());
    assert_eq!(store.rows().len(), 3);
}

#[tokio::test]
async fn samples_export_to_both_formats() {
    let store = MemoryResponses::default();
    store
        .insert_batch(sample_responses())
        .await
        .expect("samples insert");
    let responses = store.rows();
    let summary = AggregateSummary::build(&responses, &SummaryOptions::default());

    let report = build_report(&summary, &responses, Language::En, date(28)).expect("report");
    let raw = report.sheet("Raw Data").expect("raw data sheet");
    assert_eq!(raw.rows.len(), responses.len() + 1);
    assert!(write_xlsx(&report).expect("workbook").starts_with(b"PK"));

    let csv = String::from_utf8(raw_data_csv(&responses, Language::Am).expect("csv"))
        .expect("utf-8");
    assert_eq!(csv.lines().count(), responses.len() + 1);
    assert!(csv.starts_with("ቀን,"));
}

#[test]
fn gender_field_matches_csv_header() {
    assert_eq!(Gender::FIELD, "gender");
    assert!(CSV.starts_with(Gender::FIELD));
}
