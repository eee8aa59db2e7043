// src/pipeline/mod.rs

//! Extraction pipeline: page decoding, cursor management, date
//! filtering, and the orchestrating harvester.

pub mod cursor;
pub mod filter;
pub mod harvest;
pub mod parse;

pub use cursor::{CursorAdvance, CursorManager};
pub use filter::{DateFilter, FilterDecision};
pub use harvest::{Harvester, ProgressUpdate};
pub use parse::{ParsedPage, parse_page};
