//! Scan-check result types.
//!
//! The collector reports no findings of its own; these types exist so it can
//! sit behind the scan-check contract of the hosting scanner.

use serde::{Deserialize, Serialize};

/// A finding reported by a scan check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditIssue {
    pub name: String,
    pub detail: String,
    pub url: String,
}

impl AuditIssue {
    pub fn new(name: impl Into<String>, detail: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: detail.into(),
            url: url.into(),
        }
    }
}

/// Findings produced by one audit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    pub issues: Vec<AuditIssue>,
}

impl AuditResult {
    /// No findings.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

/// What to do with a newly reported issue that resembles an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsolidationAction {
    KeepExisting,
    KeepBoth,
}

/// Suppress a new issue that has the same name as an existing one.
pub fn consolidate_by_name(new: &AuditIssue, existing: &AuditIssue) -> ConsolidationAction {
    if existing.name == new.name {
        ConsolidationAction::KeepExisting
    } else {
        ConsolidationAction::KeepBoth
    }
}

/// The request location an active check would probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertionPoint {
    pub name: String,
    pub base_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_keeps_existing() {
        let existing = AuditIssue::new("Leaked token", "first", "https://a.example/");
        let new = AuditIssue::new("Leaked token", "second", "https://b.example/");

        assert_eq!(consolidate_by_name(&new, &existing), ConsolidationAction::KeepExisting);
    }

    #[test]
    fn test_different_names_keep_both() {
        let existing = AuditIssue::new("Leaked token", "", "https://a.example/");
        let new = AuditIssue::new("Debug endpoint", "", "https://a.example/debug");

        assert_eq!(consolidate_by_name(&new, &existing), ConsolidationAction::KeepBoth);
        // Symmetric in its arguments
        assert_eq!(consolidate_by_name(&existing, &new), ConsolidationAction::KeepBoth);
    }
}
