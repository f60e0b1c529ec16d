use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::core::classify::{self, Classifier, Incident};
use crate::core::config::Config;
use crate::core::dedup::{DedupEngine, DedupStatus};
use crate::core::error::PipelineError;
use crate::core::notify::{self, Notifier};
use crate::core::store::{WorkOrder, WorkOrderStore};

#[derive(Debug)]
pub struct SubmitReport {
    pub status: DedupStatus,
    pub work_order: WorkOrder,
}

/// End-to-end per-incident flow: classify (with bounded retries), dedup into
/// the store, then best-effort notification. The work-order write always
/// lands before the notification attempt; delivery failure never rolls it
/// back.
pub struct IncidentPipeline {
    store: Arc<WorkOrderStore>,
    classifier: Arc<dyn Classifier>,
    notifier: Option<Arc<dyn Notifier>>,
    dedup: DedupEngine,
    attempts: u32,
    retry_base_delay: Duration,
}

impl IncidentPipeline {
    pub fn new(
        store: Arc<WorkOrderStore>,
        classifier: Arc<dyn Classifier>,
        notifier: Option<Arc<dyn Notifier>>,
        config: &Config,
    ) -> Self {
        let dedup = DedupEngine::new(store.clone(), config.fingerprint_policy);
        Self {
            store,
            classifier,
            notifier,
            dedup,
            attempts: config.classifier.attempts,
            retry_base_delay: Duration::from_millis(config.classifier.retry_base_delay_ms),
        }
    }

    pub async fn submit(
        &self,
        raw_text: &str,
        source: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SubmitReport, PipelineError> {
        let text = raw_text.trim();
        if text.is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let classification = classify::classify_with_retry(
            self.classifier.as_ref(),
            text,
            source,
            self.attempts,
            self.retry_base_delay,
        )
        .await?;
        info!(
            "Classified as {} / {}",
            classification.category, classification.severity
        );

        let incident = Incident {
            text: text.to_string(),
            source: source.map(str::to_string),
            received_at: now,
        };
        let outcome = self
            .dedup
            .process(&incident, &classification, incident.received_at)
            .await?;
        let mut work_order = outcome.work_order;

        if let Some(notifier) = &self.notifier {
            let message = notify::render_summary(&work_order);
            match notifier.notify(&message).await {
                Ok(()) => match self.store.mark_notified(&work_order.fingerprint).await {
                    Ok(()) => work_order.notified = true,
                    Err(err) => warn!(
                        "Delivered notification for {} but could not record it: {}",
                        work_order.fingerprint, err
                    ),
                },
                Err(err) => warn!(
                    "Notification delivery failed for {}: {}",
                    work_order.fingerprint, err
                ),
            }
        }

        Ok(SubmitReport {
            status: outcome.status,
            work_order,
        })
    }
}
