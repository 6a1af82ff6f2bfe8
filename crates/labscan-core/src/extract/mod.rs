//! Text extraction: cleanup, pattern matching, tables and label normalization.

mod normalizer;
mod patterns;
mod preprocess;
mod table;

pub use normalizer::Normalizer;
pub use patterns::{ExtractionRule, LabValueExtractor, Reading, RuleMatch, RuleTarget};
pub use preprocess::{clean_line, clean_text};
pub use table::{extract_tables, is_header, parse_row, TableRow};
