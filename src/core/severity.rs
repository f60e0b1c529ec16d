use serde::{Deserialize, Serialize};

/// Ordered severity scale for classified incidents.
///
/// Persisted as the integer rank so escalation can be decided in SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl Severity {
    pub fn rank(self) -> i64 {
        self as i64
    }

    pub fn from_rank(rank: i64) -> Option<Self> {
        match rank {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            4 => Some(Self::Critical),
            _ => None,
        }
    }

    /// Lenient parse for values coming back from the classification service.
    ///
    /// Accepts level names, the legacy P-codes (P1 highest), and integer
    /// ranks 1-4 either as numbers or digit strings.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().and_then(Self::from_rank),
            serde_json::Value::String(s) => Self::from_label(s),
            _ => None,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            "p1" => Some(Self::Critical),
            "p2" => Some(Self::High),
            "p3" => Some(Self::Medium),
            other => other.parse::<i64>().ok().and_then(Self::from_rank),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_ordered() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn rank_roundtrip() {
        for sev in [
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ] {
            assert_eq!(Severity::from_rank(sev.rank()), Some(sev));
        }
        assert_eq!(Severity::from_rank(0), None);
        assert_eq!(Severity::from_rank(5), None);
    }

    #[test]
    fn parses_level_names_case_insensitively() {
        assert_eq!(Severity::from_label("High"), Some(Severity::High));
        assert_eq!(Severity::from_label(" critical "), Some(Severity::Critical));
        assert_eq!(Severity::from_label("LOW"), Some(Severity::Low));
    }

    #[test]
    fn parses_p_codes_with_p1_highest() {
        assert_eq!(Severity::from_label("P1"), Some(Severity::Critical));
        assert_eq!(Severity::from_label("p2"), Some(Severity::High));
        assert_eq!(Severity::from_label("P3"), Some(Severity::Medium));
    }

    #[test]
    fn parses_json_numbers_and_digit_strings() {
        assert_eq!(
            Severity::from_value(&serde_json::json!(3)),
            Some(Severity::High)
        );
        assert_eq!(
            Severity::from_value(&serde_json::json!("2")),
            Some(Severity::Medium)
        );
    }

    #[test]
    fn rejects_unknown_values() {
        assert_eq!(Severity::from_label("unknown"), None);
        assert_eq!(Severity::from_value(&serde_json::json!(null)), None);
        assert_eq!(Severity::from_value(&serde_json::json!(99)), None);
    }
}
