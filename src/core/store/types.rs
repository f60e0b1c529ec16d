use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::severity::Severity;

/// One durable work order. Exactly one row exists per fingerprint; rows are
/// only ever created or updated, never deleted.
#[derive(Debug, Clone, Serialize)]
pub struct WorkOrder {
    pub fingerprint: String,
    pub category: String,
    pub severity: Severity,
    pub summary: String,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub occurrence_count: i64,
    pub notified: bool,
}

/// Result of an atomic insert-if-absent.
#[derive(Debug)]
pub enum InsertOutcome {
    Created(WorkOrder),
    Duplicate(WorkOrder),
}
