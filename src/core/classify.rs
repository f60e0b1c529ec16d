use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::config::ClassifierConfig;
use crate::core::error::{ClassifyError, PipelineError};
use crate::core::severity::Severity;

/// One raw report, before classification. Not persisted.
#[derive(Debug, Clone)]
pub struct Incident {
    pub text: String,
    pub source: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// Validated judgment from the analysis service.
#[derive(Debug, Clone)]
pub struct Classification {
    pub category: String,
    pub severity: Severity,
    pub summary: String,
    pub fingerprint_hint: Option<String>,
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        text: &str,
        source: Option<&str>,
    ) -> Result<Classification, ClassifyError>;
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

/// Loosely-typed service payload; converted into [`Classification`] at the
/// boundary so nothing untyped propagates inward.
#[derive(Deserialize)]
struct ClassifyResponse {
    #[serde(default)]
    category: String,
    #[serde(default)]
    severity: serde_json::Value,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    fingerprint_hint: Option<String>,
}

impl Classification {
    fn from_response(raw: ClassifyResponse) -> Result<Self, ClassifyError> {
        let category = raw.category.trim().to_string();
        if category.is_empty() {
            return Err(ClassifyError::Malformed("category is blank".to_string()));
        }
        let severity = Severity::from_value(&raw.severity).ok_or_else(|| {
            ClassifyError::Malformed(format!("unrecognized severity value: {}", raw.severity))
        })?;
        Ok(Self {
            category,
            severity,
            summary: raw.summary.trim().to_string(),
            fingerprint_hint: raw.fingerprint_hint,
        })
    }
}

pub struct HttpClassifier {
    client: Client,
    url: String,
    api_token: Option<String>,
}

impl HttpClassifier {
    pub fn new(url: &str, cfg: &ClassifierConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            api_token: cfg.api_token.clone(),
        })
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(
        &self,
        text: &str,
        source: Option<&str>,
    ) -> Result<Classification, ClassifyError> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&ClassifyRequest { text, source });
        if let Some(token) = &self.api_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let res = request.send().await?;
        if !res.status().is_success() {
            return Err(ClassifyError::Transport(anyhow!(
                "classifier returned {}: {}",
                res.status(),
                res.text().await.unwrap_or_default()
            )));
        }
        let parsed: ClassifyResponse = res.json().await?;
        Classification::from_response(parsed)
    }
}

/// Call the classifier with a bounded retry budget and linearly increasing
/// delay. Malformed responses are never retried; transport failures are,
/// until the budget is spent.
pub async fn classify_with_retry(
    classifier: &dyn Classifier,
    text: &str,
    source: Option<&str>,
    attempts: u32,
    base_delay: Duration,
) -> Result<Classification, PipelineError> {
    let attempts = attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match classifier.classify(text, source).await {
            Ok(classification) => return Ok(classification),
            Err(err) => {
                if !err.is_retryable() || attempt >= attempts {
                    return Err(PipelineError::ClassificationUnavailable {
                        attempts: attempt,
                        source: err,
                    });
                }
                warn!(
                    "Classification attempt {}/{} failed, retrying: {}",
                    attempt, attempts, err
                );
                tokio::time::sleep(base_delay * attempt).await;
            }
        }
    }
}
