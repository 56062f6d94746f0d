pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod transform;
pub mod types;

pub use config::Config;
pub use error::{ConvertError, Result};
pub use parser::{JsonRowsParser, ParsedSheet, RowParser, WorkbookParser};
pub use pipeline::{ConversionSummary, Converter, OutputTarget};
pub use transform::{
    AliasTagging, BuilderOptions, ClientRecord, ClientRecordBuilder, HeaderMode, RowTransformer,
};
pub use types::{EntityKind, RawCell, Row};
