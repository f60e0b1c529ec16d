use anyhow::{Result, bail};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::core::classify::Classification;

/// How a fingerprint hint from the classification service is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FingerprintPolicy {
    /// A non-blank hint replaces the content hash verbatim.
    #[default]
    PreferHint,
    /// Hints are ignored; identity always comes from normalized content.
    ContentOnly,
}

/// Derive the stable dedup key for an incident.
///
/// Two reports that normalize to the same text and carry the same category
/// always produce the same fingerprint.
pub fn derive(
    text: &str,
    classification: &Classification,
    policy: FingerprintPolicy,
) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        bail!("cannot fingerprint an empty incident report");
    }
    let category = classification.category.trim();
    if category.is_empty() {
        bail!("classification carries no category");
    }

    if policy == FingerprintPolicy::PreferHint
        && let Some(hint) = classification.fingerprint_hint.as_deref()
    {
        let hint = hint.trim();
        if !hint.is_empty() {
            return Ok(hint.to_string());
        }
    }

    let mut hasher = Sha256::new();
    hasher.update(normalize(trimmed).as_bytes());
    hasher.update(b"|");
    hasher.update(category.to_lowercase().as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Case-fold, strip punctuation, collapse whitespace runs.
fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::severity::Severity;

    fn classification(category: &str, hint: Option<&str>) -> Classification {
        Classification {
            category: category.to_string(),
            severity: Severity::Medium,
            summary: "test".to_string(),
            fingerprint_hint: hint.map(str::to_string),
        }
    }

    #[test]
    fn normalization_makes_equivalent_reports_collide() {
        let c = classification("mechanical", None);
        let a = derive("Pump 3 overheating, 95C", &c, FingerprintPolicy::ContentOnly).unwrap();
        let b = derive("  pump 3  OVERHEATING...  95c ", &c, FingerprintPolicy::ContentOnly)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn category_participates_in_identity() {
        let text = "pump 3 overheating";
        let a = derive(
            text,
            &classification("mechanical", None),
            FingerprintPolicy::ContentOnly,
        )
        .unwrap();
        let b = derive(
            text,
            &classification("electrical", None),
            FingerprintPolicy::ContentOnly,
        )
        .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn prefer_hint_takes_non_blank_hint_verbatim() {
        let c = classification("mechanical", Some("sensor-7/fault-12"));
        let fp = derive("pump noise", &c, FingerprintPolicy::PreferHint).unwrap();
        assert_eq!(fp, "sensor-7/fault-12");
    }

    #[test]
    fn blank_hint_falls_back_to_content_hash() {
        let hinted = classification("mechanical", Some("   "));
        let plain = classification("mechanical", None);
        let a = derive("pump noise", &hinted, FingerprintPolicy::PreferHint).unwrap();
        let b = derive("pump noise", &plain, FingerprintPolicy::PreferHint).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn content_only_ignores_hints() {
        let hinted = classification("mechanical", Some("sensor-7/fault-12"));
        let plain = classification("mechanical", None);
        let a = derive("pump noise", &hinted, FingerprintPolicy::ContentOnly).unwrap();
        let b = derive("pump noise", &plain, FingerprintPolicy::ContentOnly).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_blank_text_and_blank_category() {
        let c = classification("mechanical", None);
        assert!(derive("   ", &c, FingerprintPolicy::ContentOnly).is_err());
        let blank = classification("  ", None);
        assert!(derive("pump noise", &blank, FingerprintPolicy::ContentOnly).is_err());
    }

    #[test]
    fn fingerprint_is_fixed_length_hex() {
        let c = classification("mechanical", None);
        let fp = derive("pump noise", &c, FingerprintPolicy::ContentOnly).unwrap();
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
