//! The scan-check contract of the hosting scanner.

use crate::types::exchange::HttpExchange;
use crate::types::issue::{AuditIssue, AuditResult, ConsolidationAction, InsertionPoint};

/// A check the scanner invokes per exchange.
///
/// Passive audits may run concurrently from several worker threads.
pub trait ScanCheck: Send + Sync {
    /// Probe an insertion point.
    fn active_audit(&self, exchange: &HttpExchange, insertion_point: &InsertionPoint)
        -> AuditResult;

    /// Observe an exchange without sending anything.
    fn passive_audit(&self, exchange: &HttpExchange) -> AuditResult;

    /// Resolve a newly reported issue against an existing one.
    fn consolidate_issues(&self, new: &AuditIssue, existing: &AuditIssue) -> ConsolidationAction;
}
