use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::metrics;
use crate::parser::{parser_for_path, ParsedSheet};
use crate::transform::{BuilderOptions, ClientRecord, ClientRecordBuilder, RowTransformer};
use crate::types::Row;

/// Where converted JSONL goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    pub fn describe(&self) -> String {
        match self {
            OutputTarget::Stdout => "<stdout>".to_string(),
            OutputTarget::File(path) => path.display().to_string(),
        }
    }
}

/// Result of a complete conversion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    pub total_rows: usize,
    pub written: usize,
    pub skipped_empty: usize,
    /// Set when the run was stopped before the last row
    pub cancelled: bool,
}

/// Apply the default builder to every row, one record per row
pub fn transform(rows: &[Row], options: &BuilderOptions) -> Vec<ClientRecord> {
    let builder = ClientRecordBuilder::new(options.clone());
    rows.iter().map(|row| builder.build(row)).collect()
}

/// True when a serialized record carries more than its `objectType` marker
pub fn has_content(record: &Value) -> bool {
    record.as_object().is_some_and(|fields| fields.len() > 1)
}

/// Drives rows through a transformer and serializes the results
pub struct Converter<T: RowTransformer> {
    transformer: T,
    skip_empty_records: bool,
}

impl<T: RowTransformer> Converter<T> {
    pub fn new(transformer: T, skip_empty_records: bool) -> Self {
        Self {
            transformer,
            skip_empty_records,
        }
    }

    /// Serialized records for every row, minus empty ones when configured
    pub fn convert(&self, rows: &[Row]) -> Result<Vec<Value>> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(value) = self.convert_row(row)? {
                out.push(value);
            }
        }
        Ok(out)
    }

    fn convert_row(&self, row: &Row) -> Result<Option<Value>> {
        let value = self.transformer.transform(row).to_json()?;
        if self.skip_empty_records && !has_content(&value) {
            return Ok(None);
        }
        Ok(Some(value))
    }

    /// Write one compact JSON object per line.
    ///
    /// `stop` is checked between rows; everything written before it was
    /// raised is flushed and counted.
    #[instrument(skip_all, fields(transformer = %self.transformer.name(), rows = rows.len()))]
    pub fn write_jsonl<W: Write>(
        &self,
        rows: &[Row],
        mut writer: W,
        stop: &AtomicBool,
    ) -> Result<ConversionSummary> {
        let started = std::time::Instant::now();
        let mut summary = ConversionSummary {
            total_rows: rows.len(),
            ..ConversionSummary::default()
        };

        for (i, row) in rows.iter().enumerate() {
            if stop.load(Ordering::Relaxed) {
                warn!("Conversion cancelled after {} of {} rows", i, rows.len());
                summary.cancelled = true;
                break;
            }

            match self.convert_row(row)? {
                Some(value) => {
                    serde_json::to_writer(&mut writer, &value)?;
                    writer.write_all(b"\n")?;
                    summary.written += 1;
                    metrics::convert::record_written();
                }
                None => {
                    debug!("Skipping empty record for row {}", i + 1);
                    summary.skipped_empty += 1;
                    metrics::convert::record_skipped();
                }
            }

            if (i + 1) % 500 == 0 {
                debug!("Converted {}/{} rows", i + 1, rows.len());
            }
        }
        writer.flush()?;

        metrics::convert::batch_duration(started.elapsed().as_secs_f64());
        info!(
            "Converted {} rows ({} written, {} empty skipped)",
            summary.total_rows, summary.written, summary.skipped_empty
        );
        Ok(summary)
    }

    /// Write to stdout or a file, creating parent directories as needed
    pub fn write_to(
        &self,
        rows: &[Row],
        target: &OutputTarget,
        stop: &AtomicBool,
    ) -> Result<ConversionSummary> {
        match target {
            OutputTarget::Stdout => {
                let stdout = io::stdout();
                self.write_jsonl(rows, BufWriter::new(stdout.lock()), stop)
            }
            OutputTarget::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                let file = fs::File::create(path)?;
                self.write_jsonl(rows, BufWriter::new(file), stop)
            }
        }
    }
}

/// `<dir>/<input stem>_<timestamp>.jsonl`
pub fn default_output_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "clients".to_string());
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    output_dir.join(format!("{stem}_{timestamp}.jsonl"))
}

/// Read and decode an input file off the async runtime's worker threads
#[instrument]
pub async fn load_sheet(input: &Path, sheet: Option<String>) -> Result<ParsedSheet> {
    let parser = parser_for_path(input, sheet)?;
    info!("📄 Reading {} with the {} parser", input.display(), parser.name());
    let bytes = tokio::fs::read(input).await?;
    let sheet = tokio::task::spawn_blocking(move || parser.parse(&bytes)).await??;
    Ok(sheet)
}

/// Convert already-loaded rows on a blocking thread
pub async fn convert_rows<T>(
    converter: Arc<Converter<T>>,
    rows: Vec<Row>,
    target: OutputTarget,
    stop: Arc<AtomicBool>,
) -> Result<ConversionSummary>
where
    T: RowTransformer + 'static,
{
    if rows.is_empty() {
        warn!("⚠️ No rows to convert");
    }
    tokio::task::spawn_blocking(move || converter.write_to(&rows, &target, &stop)).await?
}
