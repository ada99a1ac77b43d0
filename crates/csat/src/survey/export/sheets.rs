use chrono::NaiveDate;

use super::{Cell, ExportError, Report, Sheet};
use crate::survey::domain::{DemographicValue, Language};
use crate::survey::questionnaire::ItemKey;
use crate::survey::response::SurveyResponse;
use crate::survey::summary::{
    dimension_statistics, question_performance, AggregateSummary, PerformanceSort, Tally,
};

const OFFICE_EN: &str = "Lemi Kura Sub-City Peace and Security Office";
const OFFICE_AM: &str = "ለሚ ኩራ ክፍለ ከተማ ሰላምና ደህንነት ቢሮ";

const FONT_SHEET: &str = "የፊደል መመሪያ";

const FONT_INSTRUCTIONS: &[&str] = &[
    "የአማርኛ ፊደል መመሪያ - Amharic Font Instructions",
    "",
    "ይህ ሪፖርት አማርኛ ጽሁፍ ይዟል። ትክክለኛ እይታ ለማግኘት የሚከተሉትን ያድርጉ:",
    "This report contains Amharic text. For proper display, please follow these steps:",
    "",
    "1. የሚመከሩ ፊደሎች - Recommended Fonts:",
    "   • Nyala (Windows ላይ ነባር - Built-in on Windows)",
    "   • Ebrima (Windows 8+ ላይ ነባር - Built-in on Windows 8+)",
    "   • Noto Sans Ethiopic (Google Fonts)",
    "   • Kefa (macOS ላይ ነባር - Built-in on macOS)",
    "",
    "2. Excel ውስጥ ፊደል መቀየር - Changing Font in Excel:",
    "   • ሁሉንም ሴሎች ይምረጡ (Ctrl+A)",
    "   • Home > Font dropdown",
    "   • ከላይ የተዘረዘሩትን ፊደሎች ይምረጡ",
    "",
    "3. ችግር ካጋጠመ - If you have issues:",
    "   • ፊደሉ በትክክል መጫኑን ያረጋግጡ",
    "   • Excel ን እንደገና ይክፈቱ",
    "   • ሌላ አማርኛ ፊደል ይሞክሩ",
    "",
    "ማሳሰቢያ: ይህ መመሪያ ሪፖርቱን በትክክል ለማንበብ ብቻ ነው።",
    "Note: These instructions are only for proper reading of the report.",
];

/// Assemble the report. Fails with [`ExportError::NothingToExport`] rather
/// than producing an empty document.
pub fn build_report(
    summary: &AggregateSummary,
    responses: &[SurveyResponse],
    language: Language,
    generated_on: NaiveDate,
) -> Result<Report, ExportError> {
    if responses.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let mut sheets = vec![
        executive_summary(summary, language, generated_on),
        dimension_analysis(responses, language),
        question_sheet(responses, language),
        demographics(summary, language),
        raw_data(responses, language),
    ];
    if language == Language::Am {
        sheets.push(font_instructions());
    }

    Ok(Report {
        language,
        title: language
            .pick("Customer Satisfaction Report", "የደንበኛ እርካታ ሪፖርት")
            .to_string(),
        subject: language.pick(OFFICE_EN, OFFICE_AM).to_string(),
        generated_on,
        sheets,
    })
}

fn executive_summary(
    summary: &AggregateSummary,
    language: Language,
    generated_on: NaiveDate,
) -> Sheet {
    let pick = |en, am| language.pick(en, am);
    let mut sheet = Sheet::new(pick("Executive Summary", "አጠቃላይ ማጠቃለያ"));

    sheet.push(vec![Cell::text(pick(
        "Customer Satisfaction Report - Executive Summary",
        "የደንበኛ እርካታ ሪፖርት - አጠቃላይ ማጠቃለያ",
    ))]);
    sheet.blank_line();
    sheet.push(vec![Cell::text(pick(OFFICE_EN, OFFICE_AM))]);
    sheet.push(vec![
        Cell::text(pick("Report Date:", "የሪፖርት ቀን:")),
        Cell::text(generated_on.format("%Y-%m-%d").to_string()),
    ]);
    sheet.blank_line();

    sheet.push(vec![Cell::text(pick("Key Metrics", "ቁልፍ አመላካቾች"))]);
    sheet.push(vec![
        Cell::text(pick("Total Responses:", "አጠቃላይ ምላሾች:")),
        Cell::count(summary.total_responses),
    ]);
    sheet.push(vec![
        Cell::text(pick("Overall CSAT Score:", "አጠቃላይ እርካታ ነጥብ:")),
        Cell::Score(summary.overall_csat),
    ]);
    sheet.push(vec![
        Cell::text(pick("Response Rate:", "ምላሽ መጠን:")),
        Cell::Percent(summary.response_rate),
    ]);
    sheet.blank_line();

    sheet.push(vec![Cell::text(pick(
        "Service Quality Dimensions",
        "የአገልግሎት ጥራት ልኬቶች",
    ))]);
    for (dimension, score) in summary.dimension_scores.iter() {
        sheet.push(vec![
            Cell::text(format!("{}:", dimension.label(language))),
            Cell::Score(score),
        ]);
    }
    sheet.blank_line();

    sheet.push(vec![Cell::text(pick("Demographics Summary", "የሕዝብ ስብስብ ማጠቃለያ"))]);
    let counts = &summary.demographic_counts;
    tally_rows(&mut sheet, pick("Gender:", "ፆታ:"), &counts.gender, language);
    tally_rows(&mut sheet, pick("Age Groups:", "ዕድሜ ክልል:"), &counts.age, language);
    tally_rows(
        &mut sheet,
        pick("Marital Status:", "የጋብቻ ሁኔታ:"),
        &counts.marital_status,
        language,
    );
    tally_rows(
        &mut sheet,
        pick("Education Level:", "የትምህርት ደረጃ:"),
        &counts.education_level,
        language,
    );
    sheet
}

fn tally_rows<T: DemographicValue>(
    sheet: &mut Sheet,
    heading: &str,
    tally: &Tally<T>,
    language: Language,
) {
    sheet.push(vec![Cell::text(heading)]);
    for (value, count) in tally.iter() {
        sheet.push(vec![Cell::text(value.label(language)), Cell::count(count)]);
    }
}

fn dimension_analysis(responses: &[SurveyResponse], language: Language) -> Sheet {
    let pick = |en, am| language.pick(en, am);
    let mut sheet = Sheet::new(pick("Dimension Analysis", "የልኬት ትንታኔ"));
    sheet.push(header(&[
        pick("Dimension", "ልኬት"),
        pick("Average Score", "አማካይ ነጥብ"),
        pick("Response Count", "ምላሾች ብዛት"),
        pick("Highest Score", "ከፍተኛ ነጥብ"),
        pick("Lowest Score", "ዝቅተኛ ነጥብ"),
        pick("Standard Deviation", "መደበኛ ልዩነት"),
    ]));

    for stats in dimension_statistics(responses, language) {
        sheet.push(vec![
            Cell::text(stats.label),
            Cell::Score(stats.mean),
            Cell::count(stats.count),
            Cell::Score(stats.max),
            Cell::Score(stats.min),
            Cell::Score(stats.std_dev),
        ]);
    }
    sheet
}

fn question_sheet(responses: &[SurveyResponse], language: Language) -> Sheet {
    let pick = |en, am| language.pick(en, am);
    let mut sheet = Sheet::new(pick("Question Performance", "የጥያቄ አፈጻጸም"));
    sheet.push(header(&[
        pick("Question ID", "ጥያቄ ID"),
        pick("Question", "ጥያቄ"),
        pick("Dimension", "ልኬት"),
        pick("Average Score", "አማካይ ነጥብ"),
        pick("Response Count", "ምላሾች ብዛት"),
        pick("Performance Level", "አፈጻጸም ደረጃ"),
    ]));

    for row in question_performance(responses, language, PerformanceSort::Catalog) {
        sheet.push(vec![
            Cell::text(row.item.id()),
            Cell::text(row.text),
            Cell::text(row.dimension.label(language)),
            Cell::Score(row.mean),
            Cell::count(row.answered),
            Cell::text(row.level.label(language)),
        ]);
    }
    sheet
}

fn demographics(summary: &AggregateSummary, language: Language) -> Sheet {
    let pick = |en, am| language.pick(en, am);
    let counts = &summary.demographic_counts;
    let mut sheet = Sheet::new(pick("Demographics Analysis", "የሕዝብ ስብስብ ትንታኔ"));
    sheet.push(vec![Cell::text(pick("Demographics Analysis", "የሕዝብ ስብስብ ትንታኔ"))]);

    sheet.blank_line();
    tally_rows(&mut sheet, pick("Gender Distribution", "የፆታ ስርጭት"), &counts.gender, language);
    sheet.blank_line();
    tally_rows(&mut sheet, pick("Age Distribution", "የዕድሜ ስርጭት"), &counts.age, language);
    sheet.blank_line();
    tally_rows(
        &mut sheet,
        pick("Education Level Distribution", "የትምህርት ደረጃ ስርጭት"),
        &counts.education_level,
        language,
    );
    sheet.blank_line();
    tally_rows(
        &mut sheet,
        pick("Marital Status Distribution", "የጋብቻ ሁኔታ ስርጭት"),
        &counts.marital_status,
        language,
    );
    sheet
}

fn raw_data(responses: &[SurveyResponse], language: Language) -> Sheet {
    let mut sheet = Sheet::new(language.pick("Raw Data", "ጥሬ መረጃ"));
    sheet.rows = raw_data_rows(responses, language);
    sheet
}

/// Header plus one row per response; unanswered items are 0.
pub fn raw_data_rows(responses: &[SurveyResponse], language: Language) -> Vec<Vec<Cell>> {
    let pick = |en, am| language.pick(en, am);
    let mut head = header(&[
        pick("Date", "ቀን"),
        pick("Gender", "ፆታ"),
        pick("Age", "ዕድሜ"),
        pick("Marital Status", "የጋብቻ ሁኔታ"),
        pick("Education Level", "የትምህርት ደረጃ"),
        pick("Overall Score", "አጠቃላይ ነጥብ"),
    ]);
    head.extend(
        ItemKey::ordered()
            .into_iter()
            .map(|item| Cell::text(format!("{}_score", item.id()))),
    );

    let mut rows = Vec::with_capacity(responses.len() + 1);
    rows.push(head);
    for response in responses {
        let demographics = response.demographics();
        let mut row = vec![
            Cell::text(response.created_at().format("%Y-%m-%d").to_string()),
            Cell::text(demographics.gender.label(language)),
            Cell::text(demographics.age.label(language)),
            Cell::text(demographics.marital_status.label(language)),
            Cell::text(demographics.education_level.label(language)),
            Cell::Score(response.overall_score()),
        ];
        row.extend(ItemKey::ordered().into_iter().map(|item| {
            Cell::Count(u64::from(response.item_scores().get(item).unwrap_or(0)))
        }));
        rows.push(row);
    }
    rows
}

fn font_instructions() -> Sheet {
    let mut sheet = Sheet::new(FONT_SHEET);
    for line in FONT_INSTRUCTIONS {
        if line.is_empty() {
            sheet.blank_line();
        } else {
            sheet.push(vec![Cell::text(*line)]);
        }
    }
    sheet
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels.iter().map(|label| Cell::text(*label)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::survey::domain::{AgeGroup, Demographics, EducationLevel, Gender, MaritalStatus};
    use crate::survey::questionnaire::ItemScores;
    use crate::survey::response::ResponseId;
    use crate::survey::summary::SummaryOptions;

    fn responses() -> Vec<SurveyResponse> {
        (1..=3)
            .map(|n| {
                SurveyResponse::record(
                    ResponseId(format!("r{n}")),
                    Utc.with_ymd_and_hms(2024, 4, n, 10, 0, 0).unwrap(),
                    Demographics {
                        gender: Gender::Male,
                        age: AgeGroup::From41To50,
                        marital_status: MaritalStatus::Divorced,
                        education_level: EducationLevel::Certificate,
                    },
                    ItemScores::from_recorded(
                        ItemKey::ordered()
                            .into_iter()
                            .take(14)
                            .map(|item| (item, i64::from(n) + 2)),
                    ),
                )
            })
            .collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()
    }

    #[test]
    fn english_report_has_five_sheets_and_full_raw_rows() {
        let responses = responses();
        let summary = AggregateSummary::build(&responses, &SummaryOptions::default());
        let report = build_report(&summary, &responses, Language::En, today()).unwrap();

        let names: Vec<&str> = report.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Executive Summary",
                "Dimension Analysis",
                "Question Performance",
                "Demographics Analysis",
                "Raw Data"
            ]
        );
        let raw = report.sheet("Raw Data").unwrap();
        assert_eq!(raw.rows.len(), responses.len() + 1);
        assert_eq!(raw.rows[0].len(), 6 + 15);
        assert_eq!(raw.rows[1][20], Cell::Count(0));
    }

    #[test]
    fn amharic_report_adds_font_sheet() {
        let responses = responses();
        let summary = AggregateSummary::build(&responses, &SummaryOptions::default());
        let report = build_report(&summary, &responses, Language::Am, today()).unwrap();
        assert_eq!(report.sheets.len(), 6);
        assert_eq!(report.sheets[5].name, FONT_SHEET);
        assert_eq!(report.sheets[4].name, "ጥሬ መረጃ");
        assert_eq!(report.title, "የደንበኛ እርካታ ሪፖርት");
    }

    #[test]
    fn question_sheet_lists_every_item() {
        let responses = responses();
        let summary = AggregateSummary::build(&responses, &SummaryOptions::default());
        let report = build_report(&summary, &responses, Language::En, today()).unwrap();
        let questions = report.sheet("Question Performance").unwrap();
        assert_eq!(questions.rows.len(), 16);
        assert_eq!(questions.rows[1][3], Cell::Score(4.0));
        assert_eq!(questions.rows[1][5], Cell::text("Good"));
        assert_eq!(questions.rows[15][4], Cell::count(0));
        assert_eq!(questions.rows[15][5], Cell::text("Very Poor"));
    }

    #[test]
    fn empty_input_is_nothing_to_export() {
        let summary = AggregateSummary::build(&[], &SummaryOptions::default());
        let err = build_report(&summary, &[], Language::En, today()).unwrap_err();
        assert!(matches!(err, ExportError::NothingToExport));
    }
}
