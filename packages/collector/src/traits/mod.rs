//! Core trait abstractions for the collector.

pub mod filter;
pub mod scan_check;
pub mod store;
