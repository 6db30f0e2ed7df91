//! Turns activity records into a single-sheet spreadsheet.
//!
//! Columns come from the first record only: `HORODATEUR` followed by its
//! non-empty field labels in order. Later records are laid out against those
//! columns; labels they lack stay blank and labels the first record lacks are
//! dropped. Such divergence is reported back as [`SchemaDivergence`] so the
//! caller can warn about it instead of silently shipping a misaligned table.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rust_xlsxwriter::{Format, Workbook};
use serde_json::Value;

use super::temp_artifact::TempArtifact;
use crate::core::config::WorkerConfig;
use crate::core::error::{AppError, Result};
use crate::features::reports::models::{ActivityRecord, Field};
use crate::modules::storage::ObjectStore;
use crate::shared::constants::TIMESTAMP_COLUMN;
use crate::shared::dates;

/// Worksheet limits (header row included)
const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;
/// Longest string a worksheet cell accepts, in characters
const MAX_CELL_CHARS: usize = 32_767;

/// Single worksheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl From<&Value> for Cell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n
                .as_f64()
                .map(Cell::Number)
                .unwrap_or_else(|| Cell::Text(n.to_string())),
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// A record whose labels differ from the first record's
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDivergence {
    pub record_index: usize,
    /// Columns this record has no field for
    pub missing: Vec<String>,
    /// Labels with no column, dropped from the table
    pub unexpected: Vec<String>,
}

/// A text cell cut down to the worksheet limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncatedCell {
    pub record_index: usize,
    pub column: String,
    /// Length in characters before truncation
    pub original_chars: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub divergences: Vec<SchemaDivergence>,
    pub truncations: Vec<TruncatedCell>,
}

/// Output of a render: the on-disk artifact plus what went into it
#[derive(Debug)]
pub struct RenderedReport {
    pub artifact: TempArtifact,
    pub row_count: usize,
    pub divergences: Vec<SchemaDivergence>,
    pub truncations: Vec<TruncatedCell>,
}

pub struct ReportRenderer {
    store: Arc<dyn ObjectStore>,
    file_field_types: Vec<String>,
    temp_dir: PathBuf,
}

impl ReportRenderer {
    pub fn new(store: Arc<dyn ObjectStore>, config: &WorkerConfig) -> Self {
        Self {
            store,
            file_field_types: config.file_field_types.clone(),
            temp_dir: config.temp_dir.clone(),
        }
    }

    /// Render `records` to `{temp_dir}/{filename}`.
    ///
    /// The returned artifact deletes the file when dropped. A failed write
    /// removes whatever partial file was produced.
    pub async fn render(&self, records: &[ActivityRecord], filename: &str) -> Result<RenderedReport> {
        let table = self.build_table(records).await?;

        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let artifact = TempArtifact::new(self.temp_dir.join(filename));

        let row_count = table.rows.len();
        let divergences = table.divergences.clone();
        let truncations = table.truncations.clone();
        let path = artifact.path().to_path_buf();

        tokio::task::spawn_blocking(move || write_workbook(&table, &path))
            .await
            .map_err(|e| AppError::Render(format!("Workbook writer task failed: {}", e)))??;

        tracing::debug!(
            "Rendered {} rows to {}",
            row_count,
            artifact.path().display()
        );

        Ok(RenderedReport {
            artifact,
            row_count,
            divergences,
            truncations,
        })
    }

    /// Lay records out as rows, resolving file fields to URLs
    pub async fn build_table(&self, records: &[ActivityRecord]) -> Result<ReportTable> {
        let first = records
            .first()
            .ok_or_else(|| AppError::Render("no activity records to render".to_string()))?;

        let columns = derive_columns(first);
        let mut rows = Vec::with_capacity(records.len());
        let mut divergences = Vec::new();
        let mut truncations = Vec::new();

        for (index, record) in records.iter().enumerate() {
            if let Some(divergence) = check_schema(index, &columns, record) {
                divergences.push(divergence);
            }

            let mut cells: HashMap<&str, Cell> = HashMap::new();
            for field in &record.fields {
                let Some(label) = field.column_label() else {
                    continue;
                };
                let cell = self.field_cell(field).await?;
                cells.insert(label, cell);
            }
            cells.insert(
                TIMESTAMP_COLUMN,
                Cell::Text(dates::iso_to_datetime(&record.created_at)?),
            );

            let mut row = Vec::with_capacity(columns.len());
            for column in &columns {
                let mut cell = cells.remove(column.as_str()).unwrap_or(Cell::Empty);
                if let Some(original_chars) = truncate_cell(&mut cell) {
                    truncations.push(TruncatedCell {
                        record_index: index,
                        column: column.clone(),
                        original_chars,
                    });
                }
                row.push(cell);
            }
            rows.push(row);
        }

        Ok(ReportTable {
            columns,
            rows,
            divergences,
            truncations,
        })
    }

    async fn field_cell(&self, field: &Field) -> Result<Cell> {
        if !field.is_file_reference(&self.file_field_types) {
            return Ok(Cell::from(&field.value));
        }

        let ids = match &field.value {
            Value::Null => return Ok(Cell::Empty),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if ids.trim().is_empty() {
            return Ok(Cell::Empty);
        }

        Ok(Cell::Text(self.resolve_ids(&ids).await?))
    }

    /// `id1,id2` -> `url1,url2`; empty segments are kept so counts line up
    async fn resolve_ids(&self, ids: &str) -> Result<String> {
        let mut urls = Vec::new();
        for id in ids.split(',').map(str::trim) {
            if id.is_empty() {
                urls.push(String::new());
            } else {
                urls.push(self.store.resolve_url(id).await?);
            }
        }
        Ok(urls.join(","))
    }
}

/// `HORODATEUR` then the first record's labels, unlabelled fields skipped
fn derive_columns(first: &ActivityRecord) -> Vec<String> {
    let mut columns = vec![TIMESTAMP_COLUMN.to_string()];
    for label in first.fields.iter().filter_map(Field::column_label) {
        if !columns.iter().any(|c| c == label) {
            columns.push(label.to_string());
        }
    }
    columns
}

fn check_schema(index: usize, columns: &[String], record: &ActivityRecord) -> Option<SchemaDivergence> {
    let labels: Vec<&str> = record.fields.iter().filter_map(Field::column_label).collect();
    let present: HashSet<&str> = labels.iter().copied().collect();
    let expected: HashSet<&str> = columns[1..].iter().map(String::as_str).collect();

    let missing: Vec<String> = columns[1..]
        .iter()
        .filter(|c| !present.contains(c.as_str()))
        .cloned()
        .collect();

    let mut unexpected: Vec<String> = Vec::new();
    for label in labels {
        if !expected.contains(label) && !unexpected.iter().any(|u| u == label) {
            unexpected.push(label.to_string());
        }
    }

    if missing.is_empty() && unexpected.is_empty() {
        None
    } else {
        Some(SchemaDivergence {
            record_index: index,
            missing,
            unexpected,
        })
    }
}

/// Cut an over-long text cell to the worksheet limit, returning its original length
fn truncate_cell(cell: &mut Cell) -> Option<usize> {
    let Cell::Text(text) = cell else {
        return None;
    };
    let chars = text.chars().count();
    if chars <= MAX_CELL_CHARS {
        return None;
    }
    *text = text.chars().take(MAX_CELL_CHARS).collect();
    Some(chars)
}

/// Write the table as a single worksheet with a bold header row
pub fn write_workbook(table: &ReportTable, path: &Path) -> Result<()> {
    if table.columns.len() > MAX_COLUMNS {
        return Err(AppError::Render(format!(
            "{} columns exceed the worksheet limit of {}",
            table.columns.len(),
            MAX_COLUMNS
        )));
    }
    if table.rows.len() + 1 > MAX_ROWS {
        return Err(AppError::Render(format!(
            "{} rows exceed the worksheet limit of {}",
            table.rows.len(),
            MAX_ROWS - 1
        )));
    }

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
    }

    for (index, row) in table.rows.iter().enumerate() {
        let row_num = (index + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    worksheet.write_string(row_num, col, s)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(row_num, col, *n)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(row_num, col, *b)?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}
