//! spendwise-ingest: deterministic extraction of transaction facts from
//! notification text.

pub mod types;
pub mod parsers;

pub use parsers::Extractor;
pub use types::{ExtractedTransaction, ExtractionError, UNKNOWN_MERCHANT};
