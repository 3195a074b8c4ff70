use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::league::LeagueSeason;
use crate::records::{FieldValue, TableKind};
use crate::storage::{StoredTable, load_table};

/// Rows written per sheet, in sheet order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub sheets: Vec<(TableKind, usize)>,
}

/// One sheet per stored table, header row first. `scope` narrows every sheet
/// to a single league season.
pub fn export_xlsx(
    conn: &Connection,
    path: &Path,
    scope: Option<LeagueSeason>,
) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    let mut sheets = Vec::with_capacity(TableKind::ALL.len());
    for table in TableKind::ALL {
        let stored = load_table(conn, table, scope)?;
        let sheet = workbook.add_worksheet();
        sheet.set_name(table.name())?;
        write_table(sheet, &stored).with_context(|| format!("write sheet {table}"))?;
        sheets.push((table, stored.rows.len()));
    }
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;
    Ok(ExportReport { sheets })
}

fn write_table(worksheet: &mut Worksheet, table: &StoredTable) -> Result<()> {
    for (col_idx, name) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, name)?;
    }
    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = row_idx as u32 + 1;
        for (col_idx, value) in row.iter().enumerate() {
            let col = col_idx as u16;
            match value {
                FieldValue::Null => {}
                FieldValue::Int(v) => {
                    worksheet
                        .write_number(row_num, col, *v as f64)
                        .with_context(|| format!("write cell ({row_num},{col})"))?;
                }
                FieldValue::Text(s) => {
                    worksheet
                        .write_string(row_num, col, s)
                        .with_context(|| format!("write cell ({row_num},{col})"))?;
                }
            }
        }
    }
    Ok(())
}
