// ABOUTME: CSV bulk import pipeline for Tasklane
// ABOUTME: Groups flat CSV rows into todos with subtasks and persists them in the background

pub mod error;
pub mod parser;
pub mod pipeline;

pub use error::{ImportError, ImportResult};
pub use parser::{group_rows, read_rows, CsvRow, ParsedSubTask, TodoGroup};
pub use pipeline::{check_size, ImportPipeline, ImportSettings, ImportSummary};
