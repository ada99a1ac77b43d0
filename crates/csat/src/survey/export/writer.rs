use rust_xlsxwriter::{DocProperties, Format, Workbook};

use super::{sheets, Cell, ExportError, Report};
use crate::survey::domain::Language;
use crate::survey::response::SurveyResponse;

const AUTHOR: &str = "CSAT System";

/// Render the report as an `.xlsx` document held in memory.
pub fn write_xlsx(report: &Report) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let properties = DocProperties::new()
        .set_title(&report.title)
        .set_subject(&report.subject)
        .set_author(AUTHOR);
    workbook.set_properties(&properties);

    let heading = Format::new().set_bold();
    let score = Format::new().set_num_format("0.00");
    let percent = Format::new().set_num_format("0.0%");

    for sheet in &report.sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        worksheet.set_column_width(0, 36)?;

        for (row_index, row) in sheet.rows.iter().enumerate() {
            let row_number = row_index as u32;
            for (column_index, cell) in row.iter().enumerate() {
                let column = column_index as u16;
                match cell {
                    Cell::Blank => {}
                    Cell::Text(text) if row_index == 0 => {
                        worksheet.write_string_with_format(row_number, column, text, &heading)?;
                    }
                    Cell::Text(text) => {
                        worksheet.write_string(row_number, column, text)?;
                    }
                    Cell::Count(count) => {
                        worksheet.write_number(row_number, column, *count as f64)?;
                    }
                    Cell::Score(value) => {
                        worksheet.write_number_with_format(row_number, column, *value, &score)?;
                    }
                    Cell::Percent(ratio) => {
                        worksheet.write_number_with_format(row_number, column, *ratio, &percent)?;
                    }
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// The raw-data rows as CSV. Like the workbook, refuses an empty response set.
pub fn raw_data_csv(
    responses: &[SurveyResponse],
    language: Language,
) -> Result<Vec<u8>, ExportError> {
    if responses.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in sheets::raw_data_rows(responses, language) {
        writer.write_record(row.iter().map(Cell::display))?;
    }
    writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))
}
