use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use serde::Serialize;

use crate::core::config::NotifierConfig;
use crate::core::error::NotifyError;
use crate::core::store::WorkOrder;

/// Rendered work-order summary handed to the delivery channel.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationMessage {
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &NotificationMessage) -> Result<(), NotifyError>;
}

pub fn render_summary(order: &WorkOrder) -> NotificationMessage {
    let subject = format!(
        "[{}] {} work order ({} occurrence{})",
        order.severity,
        order.category,
        order.occurrence_count,
        if order.occurrence_count == 1 { "" } else { "s" }
    );

    let mut lines = Vec::new();
    lines.push(format!("Work order {}", short_fingerprint(&order.fingerprint)));
    lines.push(String::new());
    if !order.summary.is_empty() {
        lines.push("Summary".to_string());
        lines.push(order.summary.clone());
        lines.push(String::new());
    }
    lines.push("Details".to_string());
    lines.push(format!("- Category: {}", order.category));
    lines.push(format!("- Severity: {}", order.severity));
    lines.push(format!("- Occurrences: {}", order.occurrence_count));
    if let Some(source) = &order.source {
        lines.push(format!("- Source: {source}"));
    }
    lines.push(format!(
        "- First seen: {}",
        order.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    lines.push(format!(
        "- Last seen: {}",
        order.last_seen_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));

    NotificationMessage {
        subject,
        body: lines.join("\n"),
    }
}

fn short_fingerprint(fingerprint: &str) -> &str {
    if fingerprint.len() > 12 && fingerprint.chars().all(|c| c.is_ascii_hexdigit()) {
        &fingerprint[..12]
    } else {
        fingerprint
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Posts the rendered summary to a web-app endpoint that does the actual
/// email/webhook delivery.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    to: String,
}

impl WebhookNotifier {
    pub fn new(url: &str, cfg: &NotifierConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            to: cfg.to.clone().unwrap_or_default(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        let res = self
            .client
            .post(&self.url)
            .json(&WebhookPayload {
                to: &self.to,
                subject: &message.subject,
                body: &message.body,
            })
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected(format!("{status}: {text}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::severity::Severity;
    use chrono::{DateTime, Utc};

    fn order() -> WorkOrder {
        WorkOrder {
            fingerprint: "a".repeat(64),
            category: "mechanical".to_string(),
            severity: Severity::High,
            summary: "Overheat on Pump 3".to_string(),
            source: Some("sensor-3".to_string()),
            created_at: DateTime::parse_from_rfc3339("2026-03-01T08:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            last_seen_at: DateTime::parse_from_rfc3339("2026-03-01T09:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
            occurrence_count: 2,
            notified: false,
        }
    }

    #[test]
    fn subject_carries_severity_category_and_count() {
        let msg = render_summary(&order());
        assert_eq!(msg.subject, "[HIGH] mechanical work order (2 occurrences)");
    }

    #[test]
    fn body_lists_the_tracked_fields() {
        let msg = render_summary(&order());
        assert!(msg.body.contains("Overheat on Pump 3"));
        assert!(msg.body.contains("- Category: mechanical"));
        assert!(msg.body.contains("- Severity: HIGH"));
        assert!(msg.body.contains("- Occurrences: 2"));
        assert!(msg.body.contains("- Source: sensor-3"));
        assert!(msg.body.contains("- First seen: 2026-03-01T08:00:00Z"));
        assert!(msg.body.contains("- Last seen: 2026-03-01T09:30:00Z"));
    }

    #[test]
    fn hash_fingerprints_are_shortened_hints_kept_whole() {
        let msg = render_summary(&order());
        assert!(msg.body.starts_with(&format!("Work order {}", "a".repeat(12))));

        let mut hinted = order();
        hinted.fingerprint = "sensor-7/fault-12".to_string();
        let msg = render_summary(&hinted);
        assert!(msg.body.starts_with("Work order sensor-7/fault-12"));
    }
}
