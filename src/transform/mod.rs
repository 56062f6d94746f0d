//! Row-to-record transformation: header normalization, cell coercion and
//! record assembly.

pub mod builder;
pub mod emptiness;
pub mod extractors;
pub mod headers;
pub mod record;

pub use builder::{AliasTagging, BuilderOptions, ClientRecordBuilder};
pub use emptiness::{strip_empty, IsEmpty};
pub use headers::{HeaderMode, NormalizedRow};
pub use record::ClientRecord;

use crate::metrics;
use crate::types::{EntityKind, Row};

/// Turns one spreadsheet row into one output record.
///
/// Implementations must be pure per row: no state carried between calls and
/// no failure mode below the row.
pub trait RowTransformer: Send + Sync {
    fn transform(&self, row: &Row) -> ClientRecord;

    /// Human-readable name, used in logs
    fn name(&self) -> &str;
}

/// A wrapper that adds metrics to any transformer implementation
pub struct MetricsTransformer<T: RowTransformer> {
    inner: T,
}

impl<T: RowTransformer> MetricsTransformer<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: RowTransformer> RowTransformer for MetricsTransformer<T> {
    fn transform(&self, row: &Row) -> ClientRecord {
        let record = self.inner.transform(row);

        let entity = match EntityKind::classify(record.entity_type.as_deref()) {
            EntityKind::Person => "person",
            EntityKind::Organisation => "organisation",
            EntityKind::Other => "other",
        };
        metrics::convert::row_transformed(entity);
        if !record.identity_numbers.is_empty() {
            metrics::convert::identity_numbers_emitted(record.identity_numbers.len());
        }

        record
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
