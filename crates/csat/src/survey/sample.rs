//! Sample data for trying out the dashboard, and bulk import from CSV.

use std::fmt;
use std::io::Read;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use super::domain::{
    AgeGroup, DemographicValue, Demographics, EducationLevel, Gender, MaritalStatus,
};
use super::intake::{DemographicAnswers, IntakeError, IntakeValidator, SurveySubmission};
use super::questionnaire::{ItemKey, ItemScores, ITEM_COUNT};
use super::response::NewSurveyResponse;

struct SampleSpec {
    demographics: Demographics,
    ratings: [i64; ITEM_COUNT],
}

const SAMPLES: [SampleSpec; 5] = [
    SampleSpec {
        demographics: Demographics {
            gender: Gender::Male,
            age: AgeGroup::From31To40,
            marital_status: MaritalStatus::Married,
            education_level: EducationLevel::FirstDegree,
        },
        ratings: [5, 4, 5, 4, 5, 4, 4, 4, 5, 5, 5, 4, 4, 5, 4],
    },
    SampleSpec {
        demographics: Demographics {
            gender: Gender::Female,
            age: AgeGroup::From18To30,
            marital_status: MaritalStatus::Single,
            education_level: EducationLevel::Diploma,
        },
        ratings: [3, 3, 4, 2, 3, 3, 3, 2, 3, 4, 4, 3, 3, 3, 3],
    },
    SampleSpec {
        demographics: Demographics {
            gender: Gender::Male,
            age: AgeGroup::Over50,
            marital_status: MaritalStatus::Widowed,
            education_level: EducationLevel::Grades1To8,
        },
        ratings: [2, 1, 2, 2, 3, 1, 2, 2, 2, 3, 3, 2, 2, 1, 2],
    },
    SampleSpec {
        demographics: Demographics {
            gender: Gender::Female,
            age: AgeGroup::From41To50,
            marital_status: MaritalStatus::Divorced,
            education_level: EducationLevel::SecondDegreePlus,
        },
        ratings: [4, 5, 4, 5, 5, 5, 4, 5, 4, 5, 5, 5, 5, 4, 5],
    },
    SampleSpec {
        demographics: Demographics {
            gender: Gender::Female,
            age: AgeGroup::From31To40,
            marital_status: MaritalStatus::Married,
            education_level: EducationLevel::Grades9To12,
        },
        ratings: [4, 3, 3, 4, 4, 3, 3, 4, 4, 4, 5, 4, 3, 4, 4],
    },
];

/// Five complete responses with varied ratings and demographics.
pub fn sample_responses() -> Vec<NewSurveyResponse> {
    SAMPLES
        .iter()
        .map(|sample| NewSurveyResponse {
            demographics: sample.demographics,
            item_scores: ItemScores::from_recorded(
                ItemKey::ordered().into_iter().zip(sample.ratings),
            ),
            recorded_at: None,
        })
        .collect()
}

#[derive(Debug)]
pub enum SampleError {
    Csv(csv::Error),
    MissingColumn(&'static str),
    InvalidValue {
        line: usize,
        column: String,
        value: String,
    },
    Row { line: usize, source: IntakeError },
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::Csv(err) => write!(f, "invalid response CSV: {}", err),
            SampleError::MissingColumn(column) => {
                write!(f, "response CSV is missing the '{}' column", column)
            }
            SampleError::InvalidValue {
                line,
                column,
                value,
            } => write!(f, "line {}: '{}' is not a valid {}", line, value, column),
            SampleError::Row { line, source } => write!(f, "line {}: {}", line, source),
        }
    }
}

impl std::error::Error for SampleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SampleError::Csv(err) => Some(err),
            SampleError::Row { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<csv::Error> for SampleError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Column positions resolved from the header row.
struct Columns {
    gender: usize,
    age: usize,
    marital_status: usize,
    education_level: usize,
    created_at: Option<usize>,
    items: Vec<(ItemKey, usize)>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, SampleError> {
        let find = |name: &str| headers.iter().position(|header| header == name);
        let require = |name: &'static str| find(name).ok_or(SampleError::MissingColumn(name));

        Ok(Self {
            gender: require(Gender::FIELD)?,
            age: require(AgeGroup::FIELD)?,
            marital_status: require(MaritalStatus::FIELD)?,
            education_level: require(EducationLevel::FIELD)?,
            created_at: find("created_at"),
            items: ItemKey::ordered()
                .into_iter()
                .filter_map(|item| Some((item, find(item.id())?)))
                .collect(),
        })
    }
}

/// Parse responses from CSV, one per row, validating each row with `validator`.
/// Columns: `gender, age, marital_status, education_level`, the fifteen item
/// ids and an optional `created_at`. Any bad row fails the whole import.
pub fn import_responses_csv<R: Read>(
    reader: R,
    validator: &IntakeValidator,
) -> Result<Vec<NewSurveyResponse>, SampleError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns = Columns::locate(csv_reader.headers()?)?;

    let mut responses = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let line = index + 2;
        let cell = |position: usize| record.get(position).unwrap_or("").trim();

        let demographics = DemographicAnswers {
            gender: parse_value(line, cell(columns.gender))?,
            age: parse_value(line, cell(columns.age))?,
            marital_status: parse_value(line, cell(columns.marital_status))?,
            education_level: parse_value(line, cell(columns.education_level))?,
        };

        let mut ratings = Vec::with_capacity(columns.items.len());
        for (item, position) in &columns.items {
            let raw = cell(*position);
            if raw.is_empty() {
                continue;
            }
            let value = raw.parse::<i64>().map_err(|_| SampleError::InvalidValue {
                line,
                column: item.id().to_string(),
                value: raw.to_string(),
            })?;
            ratings.push((*item, value));
        }

        let recorded_at = match columns.created_at.map(cell) {
            Some(raw) if !raw.is_empty() => {
                Some(parse_datetime(raw).ok_or_else(|| SampleError::InvalidValue {
                    line,
                    column: "created_at".to_string(),
                    value: raw.to_string(),
                })?)
            }
            _ => None,
        };

        let mut response = validator
            .validate(SurveySubmission::from_ratings(demographics, ratings))
            .map_err(|source| SampleError::Row { line, source })?;
        response.recorded_at = recorded_at;
        responses.push(response);
    }

    Ok(responses)
}

/// Empty cells read as unanswered; anything else must be a known value.
fn parse_value<T: DemographicValue>(line: usize, raw: &str) -> Result<Option<T>, SampleError> {
    if raw.is_empty() {
        return Ok(None);
    }
    T::ordered()
        .iter()
        .copied()
        .find(|value| value.as_str().eq_ignore_ascii_case(raw))
        .map(Some)
        .ok_or_else(|| SampleError::InvalidValue {
            line,
            column: T::FIELD.to_string(),
            value: raw.to_string(),
        })
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
