use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::classify::{Classification, Incident};
use crate::core::error::PipelineError;
use crate::core::fingerprint::{self, FingerprintPolicy};
use crate::core::store::{InsertOutcome, WorkOrder, WorkOrderStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupStatus {
    New,
    Duplicate,
}

#[derive(Debug)]
pub struct DedupOutcome {
    pub status: DedupStatus,
    pub work_order: WorkOrder,
}

/// Decides "new work order" vs "duplicate of existing" on top of the store's
/// atomic insert-if-absent.
pub struct DedupEngine {
    store: Arc<WorkOrderStore>,
    policy: FingerprintPolicy,
}

impl DedupEngine {
    pub fn new(store: Arc<WorkOrderStore>, policy: FingerprintPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn process(
        &self,
        incident: &Incident,
        classification: &Classification,
        now: DateTime<Utc>,
    ) -> Result<DedupOutcome, PipelineError> {
        // Inputs are validated upstream; a derive failure here means the
        // report text was blank.
        let fingerprint = fingerprint::derive(&incident.text, classification, self.policy)
            .map_err(|_| PipelineError::EmptyInput)?;

        let outcome = self
            .store
            .insert_if_absent(
                &fingerprint,
                &classification.category,
                classification.severity,
                &classification.summary,
                incident.source.as_deref(),
                now,
            )
            .await?;

        match outcome {
            InsertOutcome::Created(work_order) => Ok(DedupOutcome {
                status: DedupStatus::New,
                work_order,
            }),
            InsertOutcome::Duplicate(_) => {
                let work_order = self
                    .store
                    .touch_duplicate(&fingerprint, classification.severity, now)
                    .await?;
                Ok(DedupOutcome {
                    status: DedupStatus::Duplicate,
                    work_order,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::severity::Severity;
    use chrono::TimeDelta;

    fn incident(text: &str) -> Incident {
        Incident {
            text: text.to_string(),
            source: Some("sensor-3".to_string()),
            received_at: t0(),
        }
    }

    fn classification(severity: Severity) -> Classification {
        Classification {
            category: "mechanical".to_string(),
            severity,
            summary: "Overheat on Pump 3".to_string(),
            fingerprint_hint: None,
        }
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn engine() -> (tempfile::TempDir, DedupEngine) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(WorkOrderStore::open(dir.path().join("wo.db")).unwrap());
        (dir, DedupEngine::new(store, FingerprintPolicy::ContentOnly))
    }

    #[tokio::test]
    async fn repeated_submissions_yield_one_order_with_matching_count() {
        let (_dir, engine) = engine();
        let n = 4;
        let mut last = None;
        for i in 0..n {
            let outcome = engine
                .process(
                    &incident("Pump 3 overheating, 95C"),
                    &classification(Severity::Medium),
                    t0() + TimeDelta::minutes(i),
                )
                .await
                .unwrap();
            last = Some(outcome);
        }
        let last = last.unwrap();
        assert_eq!(last.status, DedupStatus::Duplicate);
        assert_eq!(last.work_order.occurrence_count, n);

        let all = engine.store.scan_ordered().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn distinct_reports_create_distinct_orders() {
        let (_dir, engine) = engine();
        engine
            .process(
                &incident("Pump 3 overheating"),
                &classification(Severity::Medium),
                t0(),
            )
            .await
            .unwrap();
        let outcome = engine
            .process(
                &incident("Grain bin 7 humidity spike"),
                &classification(Severity::Medium),
                t0() + TimeDelta::minutes(1),
            )
            .await
            .unwrap();
        assert_eq!(outcome.status, DedupStatus::New);
        assert_eq!(engine.store.scan_ordered().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_escalates_but_never_downgrades() {
        let (_dir, engine) = engine();
        engine
            .process(&incident("pump"), &classification(Severity::Low), t0())
            .await
            .unwrap();
        let up = engine
            .process(
                &incident("pump"),
                &classification(Severity::High),
                t0() + TimeDelta::minutes(1),
            )
            .await
            .unwrap();
        assert_eq!(up.work_order.severity, Severity::High);

        let down = engine
            .process(
                &incident("pump"),
                &classification(Severity::Low),
                t0() + TimeDelta::minutes(2),
            )
            .await
            .unwrap();
        assert_eq!(down.work_order.severity, Severity::High);
        assert_eq!(down.work_order.occurrence_count, 3);
    }
}
