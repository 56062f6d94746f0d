use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ConvertError, Result};
use crate::types::{RawCell, Row};

/// Headers of the selected sheet plus its non-blank data rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

/// Turns raw input bytes into rows
pub trait RowParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedSheet>;

    fn name(&self) -> &'static str;
}

/// Reads xls, xlsx, xlsm, xlsb and ods workbooks
#[derive(Debug, Clone, Default)]
pub struct WorkbookParser {
    /// Sheet to read; the first sheet when unset
    pub sheet: Option<String>,
}

impl WorkbookParser {
    pub fn new(sheet: Option<String>) -> Self {
        Self { sheet }
    }

    fn read_range(&self, bytes: &[u8]) -> Result<(String, Range<Data>)> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let sheet_names = workbook.sheet_names();
        debug!("WorkbookParser: sheets={:?}", sheet_names);

        let sheet_name = match &self.sheet {
            Some(name) if sheet_names.iter().any(|s| s == name) => name.clone(),
            Some(name) => return Err(ConvertError::SheetNotFound(name.clone())),
            None => sheet_names
                .first()
                .cloned()
                .ok_or_else(|| ConvertError::SheetNotFound("<first sheet>".to_string()))?,
        };

        let range = workbook.worksheet_range(&sheet_name)?;
        Ok((sheet_name, range))
    }
}

impl RowParser for WorkbookParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedSheet> {
        debug!("WorkbookParser: start bytes_len={}", bytes.len());
        let (sheet_name, range) = self.read_range(bytes)?;

        let mut lines = range.rows();
        let Some(header_cells) = lines.next() else {
            warn!("WorkbookParser: sheet '{}' is empty", sheet_name);
            return Ok(ParsedSheet::default());
        };
        let headers: Vec<String> = header_cells.iter().map(header_text).collect();

        let rows: Vec<Row> = lines
            .filter(|cells| cells.iter().any(|c| !matches!(c, Data::Empty)))
            .map(|cells| {
                headers
                    .iter()
                    .zip(cells.iter())
                    .filter(|(header, _)| !header.trim().is_empty())
                    .map(|(header, cell)| (header.clone(), cell_from_data(cell)))
                    .collect()
            })
            .collect();

        info!(
            "WorkbookParser: sheet '{}' headers={} rows={}",
            sheet_name,
            headers.len(),
            rows.len()
        );
        Ok(ParsedSheet { headers, rows })
    }

    fn name(&self) -> &'static str {
        "workbook"
    }
}

/// Reads a JSON array of flat objects, one object per row
#[derive(Debug, Clone, Default)]
pub struct JsonRowsParser;

impl RowParser for JsonRowsParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedSheet> {
        debug!("JsonRowsParser: start bytes_len={}", bytes.len());
        let value: Value = serde_json::from_slice(bytes)?;
        let Some(items) = value.as_array() else {
            return Err(ConvertError::UnsupportedInput {
                message: "expected a JSON array of objects".to_string(),
            });
        };

        let mut headers: Vec<String> = Vec::new();
        let mut rows = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let Some(row) = Row::from_json(item) else {
                warn!("JsonRowsParser: skipping non-object item at index {}", index);
                continue;
            };
            for header in row.headers() {
                if !headers.iter().any(|h| h == header) {
                    headers.push(header.to_string());
                }
            }
            rows.push(row);
        }

        info!("JsonRowsParser: headers={} rows={}", headers.len(), rows.len());
        Ok(ParsedSheet { headers, rows })
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// Pick a parser from the input file's extension
pub fn parser_for_path(path: &Path, sheet: Option<String>) -> Result<Box<dyn RowParser>> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Box::new(WorkbookParser::new(sheet))),
        "json" => Ok(Box::new(JsonRowsParser)),
        other => Err(ConvertError::UnsupportedInput {
            message: format!("unrecognised file extension '{other}' for {}", path.display()),
        }),
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty | Data::Error(_) => String::new(),
        other => match cell_from_data(other) {
            RawCell::Number(n) if n.fract() == 0.0 => format!("{}", n as i64),
            _ => other.to_string(),
        },
    }
}

/// Map a workbook cell onto the reader-neutral cell type
pub fn cell_from_data(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Null,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(RawCell::Date)
            .unwrap_or(RawCell::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
    }
}
