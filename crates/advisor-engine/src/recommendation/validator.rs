use advisor_core::error::AdvisorError;
use advisor_core::recommendation::GeneratedRecommendation;
use serde::{Deserialize, Serialize};
use strum::Display;

const ISSUE_PENALTY: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    pub severity: IssueSeverity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// No high-severity issues
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub suggestions: Vec<String>,
    pub confidence: f64,
}

impl ValidationReport {
    /// The first high-severity issue as a validation error
    pub fn to_error(&self) -> Option<AdvisorError> {
        self.issues
            .iter()
            .find(|issue| issue.severity == IssueSeverity::High)
            .map(|issue| AdvisorError::validation(&issue.field, &issue.message))
    }
}

/// Structural and quality checks on generated recommendations
#[derive(Debug, Clone, Default)]
pub struct RecommendationValidator;

impl RecommendationValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, recommendation: &GeneratedRecommendation) -> ValidationReport {
        let mut issues = Vec::new();
        let mut suggestions = Vec::new();
        let mut issue = |field: &str, message: &str, severity| {
            issues.push(ValidationIssue {
                field: field.to_string(),
                message: message.to_string(),
                severity,
            })
        };

        if recommendation.title.trim().is_empty() {
            issue("title", "Title is empty", IssueSeverity::High);
        }
        if recommendation.description.trim().is_empty() {
            issue("description", "Description is empty", IssueSeverity::High);
        }
        if recommendation.source_insights.is_empty() {
            issue(
                "sourceInsights",
                "Recommendation is not linked to any insight",
                IssueSeverity::High,
            );
        }
        if !(0.0..=1.0).contains(&recommendation.confidence) {
            issue(
                "confidence",
                "Confidence must be within [0, 1]",
                IssueSeverity::Medium,
            );
        }
        for (field, value) in [
            ("relevanceScore", recommendation.relevance_score),
            ("impactPotential", recommendation.impact_potential),
            ("feasibilityScore", recommendation.feasibility_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                issue(field, "Score must be within [0, 1]", IssueSeverity::Medium);
            }
        }
        if recommendation.action_steps.is_empty() {
            issue(
                "actionSteps",
                "Recommendation has no action steps",
                IssueSeverity::Medium,
            );
            suggestions.push("Add at least one concrete action step".to_string());
        }
        if recommendation.success_metrics.is_empty() {
            suggestions.push("Describe how success will be measured".to_string());
        }

        let is_valid = !issues.iter().any(|i| i.severity == IssueSeverity::High);
        let confidence = (1.0 - ISSUE_PENALTY * issues.len() as f64).max(0.0);
        ValidationReport {
            is_valid,
            issues,
            suggestions,
            confidence,
        }
    }
}
