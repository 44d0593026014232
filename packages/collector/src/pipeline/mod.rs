//! Extraction pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Path splitting and file/directory classification
//! - Parameter name validation
//! - Cache-assisted JSON traversal
//! - HTML input-field scraping as the non-JSON fallback
//! - Background handoff to the store

pub mod collector;
pub mod html;
pub mod json;
pub mod params;
pub mod path;

pub use collector::{BodyOutcome, Collector, CollectorStats};
pub use html::{scrape_fields, FieldScrape};
pub use json::{extract_json, traverse, JsonSkip};
pub use params::{is_valid_name, normalize_param_name};
pub use path::{is_file_segment, normalize_path, split_path, PathParts};
