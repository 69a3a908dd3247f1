//! Reservation label → [`Purpose`] classification.
//!
//! Rules are ordered data: the first matching rule wins, blank labels are jobs,
//! and anything unmatched falls back to `fallback`.

use serde::{Deserialize, Serialize};

use crate::table::Purpose;

/// Written in YAML as `{ kind: prefix, value: DAT }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum LabelPattern {
    Exact(String),
    Prefix(String),
}

impl LabelPattern {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            LabelPattern::Exact(p) => label == p,
            LabelPattern::Prefix(p) => label.starts_with(p.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurposeRule {
    pub pattern: LabelPattern,
    pub purpose: Purpose,
}

impl PurposeRule {
    fn new(pattern: LabelPattern, purpose: Purpose) -> Self {
        PurposeRule { pattern, purpose }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurposeRules {
    pub rules: Vec<PurposeRule>,
    #[serde(default = "default_fallback")]
    pub fallback: Purpose,
}

fn default_fallback() -> Purpose {
    Purpose::Job
}

impl Default for PurposeRules {
    /// Maintenance and dedicated-access reservations (`DST`, `DAT*`,
    /// `PreventMaint`), plus labels that are already classified.
    fn default() -> Self {
        use LabelPattern::*;
        PurposeRules {
            rules: vec![
                PurposeRule::new(Exact("DST".into()), Purpose::Reservation),
                PurposeRule::new(Prefix("DAT".into()), Purpose::Reservation),
                PurposeRule::new(Exact("PreventMaint".into()), Purpose::Reservation),
                PurposeRule::new(Exact("reservation".into()), Purpose::Reservation),
                PurposeRule::new(Exact("job".into()), Purpose::Job),
            ],
            fallback: default_fallback(),
        }
    }
}

impl PurposeRules {
    pub fn classify(&self, label: &str) -> Purpose {
        let label = label.trim();
        if label.is_empty() {
            return Purpose::Job;
        }
        self.rules
            .iter()
            .find(|r| r.pattern.matches(label))
            .map(|r| r.purpose)
            .unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reservation_tags() {
        let rules = PurposeRules::default();
        assert_eq!(rules.classify("DST"), Purpose::Reservation);
        assert_eq!(rules.classify("DAT"), Purpose::Reservation);
        assert_eq!(rules.classify("DAT_2022_03"), Purpose::Reservation);
        assert_eq!(rules.classify("PreventMaint"), Purpose::Reservation);
    }

    #[test]
    fn test_blank_and_unknown_labels_are_jobs() {
        let rules = PurposeRules::default();
        assert_eq!(rules.classify(""), Purpose::Job);
        assert_eq!(rules.classify("   "), Purpose::Job);
        assert_eq!(rules.classify("xDST"), Purpose::Job);
        assert_eq!(rules.classify("DST2"), Purpose::Job);
        assert_eq!(rules.classify("PreventMaintenance"), Purpose::Job);
        assert_eq!(rules.classify("weekly_debug"), Purpose::Job);
    }

    #[test]
    fn test_classified_labels_are_stable() {
        let rules = PurposeRules::default();
        assert_eq!(rules.classify("reservation"), Purpose::Reservation);
        assert_eq!(rules.classify("job"), Purpose::Job);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = PurposeRules {
            rules: vec![
                PurposeRule::new(LabelPattern::Exact("DAT_test".into()), Purpose::Job),
                PurposeRule::new(LabelPattern::Prefix("DAT".into()), Purpose::Reservation),
            ],
            fallback: Purpose::Job,
        };
        assert_eq!(rules.classify("DAT_test"), Purpose::Job);
        assert_eq!(rules.classify("DAT_prod"), Purpose::Reservation);
    }

    #[test]
    fn test_rules_from_yaml() {
        let yaml = r#"
rules:
  - { pattern: { kind: prefix, value: maint_ }, purpose: reservation }
  - { pattern: { kind: exact, value: open }, purpose: job }
fallback: reservation
"#;
        let rules: PurposeRules = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rules.classify("maint_march"), Purpose::Reservation);
        assert_eq!(rules.classify("open"), Purpose::Job);
        assert_eq!(rules.classify("other"), Purpose::Reservation);
        assert_eq!(rules.classify(""), Purpose::Job);
    }
}
