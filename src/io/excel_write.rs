use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::error::Result;
use crate::model::{CellValue, Table};

/// Writes a table to an `.xlsx` workbook with a single worksheet.
///
/// Decimal cells are written as their exact decimal string so converted
/// amounts never pass back through binary floating point.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&sanitize_sheet_name(&table.name))?;

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let excel_col = col_idx as u16;
            match cell {
                CellValue::Empty => {}
                CellValue::Text(value) => {
                    worksheet.write_string(excel_row, excel_col, value)?;
                }
                CellValue::Number(value) => {
                    worksheet.write_number(excel_row, excel_col, *value)?;
                }
                CellValue::Decimal(value) => {
                    worksheet.write_string(excel_row, excel_col, &value.to_string())?;
                }
                CellValue::Boolean(value) => {
                    worksheet.write_boolean(excel_row, excel_col, *value)?;
                }
            }
        }
    }

    let mut excel_table = rust_xlsxwriter::Table::new();
    excel_table.set_autofilter(true);

    let col_end = (table.columns.len() as u16).saturating_sub(1);
    let row_end = if table.rows.is_empty() {
        0
    } else {
        table.rows.len() as u32
    };
    worksheet.add_table(0, 0, row_end, col_end, &excel_table)?;

    workbook.save(path)?;
    Ok(())
}

fn sanitize_sheet_name(raw: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']', '\'', '"'];
    let mut sanitized: String = raw
        .chars()
        .map(|ch| {
            if invalid.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    sanitized = sanitized.trim().to_string();
    if sanitized.is_empty() {
        sanitized = "Sheet".to_string();
    }

    if sanitized.len() > 31 {
        sanitized.truncate(31);
    }

    sanitized
}
