// crates/advisor-core/src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{Display, EnumIter, EnumString};

/// Domain tag attached to every insight
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum InsightCategory {
    Productivity,
    Wellbeing,
    Relationships,
    Learning,
    Goals,
    Habits,
    Creativity,
    Career,
    Health,
    Finance,
    PersonalGrowth,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum InsightType {
    Observation,
    Correlation,
    Causation,
    Prediction,
    Recommendation,
    Warning,
    Opportunity,
    Achievement,
    Pattern,
    Anomaly,
}

/// A single piece of supporting evidence for an insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItem {
    pub excerpt: String,
    pub relevance_score: f64,
    pub document_path: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightTimeframe {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    pub end: DateTime<Utc>,
}

/// A scored observation about personal content, produced upstream and never
/// mutated by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: InsightCategory,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub confidence: f64,
    pub importance: f64,
    pub actionability: f64,
    pub novelty: f64,
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,
    pub timeframe: InsightTimeframe,
    #[serde(default)]
    pub related_insights: BTreeSet<String>,
    /// Optional upstream keywords; extracted from the text when empty.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Insight {
    /// Create an insight with neutral scores, no evidence and a timeframe ending now.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        category: InsightCategory,
        insight_type: InsightType,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            category,
            insight_type,
            confidence: 0.5,
            importance: 0.5,
            actionability: 0.5,
            novelty: 0.5,
            evidence: Vec::new(),
            timeframe: InsightTimeframe {
                start: None,
                end: Utc::now(),
            },
            related_insights: BTreeSet::new(),
            keywords: Vec::new(),
        }
    }

    pub fn with_scores(
        mut self,
        confidence: f64,
        importance: f64,
        actionability: f64,
        novelty: f64,
    ) -> Self {
        self.confidence = confidence;
        self.importance = importance;
        self.actionability = actionability;
        self.novelty = novelty;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<EvidenceItem>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_timeframe_end(mut self, end: DateTime<Utc>) -> Self {
        self.timeframe.end = end;
        self
    }

    pub fn with_related(mut self, related: impl IntoIterator<Item = String>) -> Self {
        self.related_insights.extend(related);
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// All four numeric scores are finite and within [0, 1].
    pub fn has_valid_scores(&self) -> bool {
        [
            self.confidence,
            self.importance,
            self.actionability,
            self.novelty,
        ]
        .iter()
        .all(|s| s.is_finite() && (0.0..=1.0).contains(s))
    }
}

impl EvidenceItem {
    pub fn new(excerpt: impl Into<String>, document_path: impl Into<String>) -> Self {
        Self {
            excerpt: excerpt.into(),
            relevance_score: 0.5,
            document_path: document_path.into(),
            timestamp: Utc::now(),
        }
    }
}

/// What the caller is assembling the insights for
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter, Default,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Purpose {
    #[default]
    DailyReview,
    WeeklySummary,
    MonthlyReport,
    ProjectReview,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter, Default,
)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum Audience {
    #[default]
    #[serde(rename = "self")]
    #[strum(to_string = "self")]
    Personal,
    #[strum(to_string = "team")]
    Team,
    #[strum(to_string = "manager")]
    Manager,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum StressLevel {
    Low,
    Moderate,
    High,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum AvailableTime {
    Minimal,
    Limited,
    Moderate,
    Abundant,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualFactors {
    #[serde(default)]
    pub life_phase: Option<String>,
    #[serde(default)]
    pub available_time: Option<AvailableTime>,
    #[serde(default)]
    pub stress_level: Option<StressLevel>,
    #[serde(default)]
    pub work_context: Option<String>,
}

/// Caller-supplied purpose/audience/factor bundle, consumed read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisContext {
    #[serde(default)]
    pub purpose: Purpose,
    #[serde(default)]
    pub audience: Audience,
    #[serde(default)]
    pub factors: ContextualFactors,
}

impl AnalysisContext {
    pub fn new(purpose: Purpose, audience: Audience) -> Self {
        Self {
            purpose,
            audience,
            factors: ContextualFactors::default(),
        }
    }

    pub fn with_factors(mut self, factors: ContextualFactors) -> Self {
        self.factors = factors;
        self
    }
}
