//! Spreadsheet reports for administrators.
//!
//! A report is first assembled as a plain [`Report`] value (sheets of rows of
//! cells) so the layout can be tested without decoding a workbook, then
//! rendered by [`write_xlsx`] or, for the raw rows only, [`raw_data_csv`].

mod sheets;
mod writer;

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::Language;

pub use sheets::{build_report, raw_data_rows};
pub use writer::{raw_data_csv, write_xlsx};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    Blank,
    Text(String),
    Count(u64),
    /// Rendered with two decimals.
    Score(f64),
    /// A ratio rendered as a percentage with one decimal.
    Percent(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn count(value: usize) -> Self {
        Self::Count(value as u64)
    }

    /// Plain-text rendering used by the CSV writer.
    pub fn display(&self) -> String {
        match self {
            Self::Blank => String::new(),
            Self::Text(text) => text.clone(),
            Self::Count(count) => count.to_string(),
            Self::Score(score) => format!("{score:.2}"),
            Self::Percent(ratio) => format!("{:.1}%", ratio * 100.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    fn blank_line(&mut self) {
        self.rows.push(vec![Cell::Blank]);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub language: Language,
    pub title: String,
    pub subject: String,
    pub generated_on: NaiveDate,
    pub sheets: Vec<Sheet>,
}

impl Report {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no survey responses to export")]
    NothingToExport,
    #[error("failed to write workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// `Customer-Satisfaction-Report-2024-05-01.xlsx` or its Amharic equivalent.
pub fn report_filename(language: Language, date: NaiveDate) -> String {
    let stem = language.pick("Customer-Satisfaction-Report", "የደንበኛ-እርካታ-ሪፖርት");
    format!("{stem}-{}.xlsx", date.format("%Y-%m-%d"))
}

pub fn raw_data_filename(date: NaiveDate) -> String {
    format!("survey-responses-{}.csv", date.format("%Y-%m-%d"))
}
