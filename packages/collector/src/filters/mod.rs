//! Exchange filter implementations.

pub mod scope;

pub use scope::{form_decode, ScopeFilter};
