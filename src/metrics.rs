//! Conversion metrics.
//!
//! Recording is a no-op until a recorder is installed; the CLI installs a
//! Prometheus recorder only when asked to dump a metrics file.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::{ConvertError, Result};

pub const ROWS_TOTAL: &str = "client_jsonl_rows_total";
pub const IDENTITY_NUMBERS_TOTAL: &str = "client_jsonl_identity_numbers_total";
pub const RECORDS_WRITTEN_TOTAL: &str = "client_jsonl_records_written_total";
pub const RECORDS_SKIPPED_TOTAL: &str = "client_jsonl_records_skipped_total";
pub const CONVERT_DURATION_SECONDS: &str = "client_jsonl_convert_duration_seconds";

/// Install a global Prometheus recorder and return the handle used to render it
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ConvertError::Config(format!("Failed to install metrics recorder: {e}")))
}

pub mod convert {
    use metrics::{counter, histogram};

    pub fn row_transformed(entity: &'static str) {
        counter!(super::ROWS_TOTAL, "entity" => entity).increment(1);
    }

    pub fn identity_numbers_emitted(count: usize) {
        counter!(super::IDENTITY_NUMBERS_TOTAL).increment(count as u64);
    }

    pub fn record_written() {
        counter!(super::RECORDS_WRITTEN_TOTAL).increment(1);
    }

    pub fn record_skipped() {
        counter!(super::RECORDS_SKIPPED_TOTAL).increment(1);
    }

    pub fn batch_duration(seconds: f64) {
        histogram!(super::CONVERT_DURATION_SECONDS).record(seconds);
    }
}
