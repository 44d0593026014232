//! Data types shared across the collector.

pub mod buckets;
pub mod config;
pub mod digest;
pub mod exchange;
pub mod issue;
