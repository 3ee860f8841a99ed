//! Mining insights for recommendation opportunities

use advisor_core::recommendation::RecommendationType;
use advisor_core::scoring::clamp01;
use advisor_core::types::{Insight, InsightCategory};
use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const ACTION_CUES: &[&str] = &[
    "should do",
    "need to",
    "needs to",
    "implement",
    "take action",
    "must",
    "get started",
];
const HABIT_CUES: &[&str] = &[
    "daily",
    "routine",
    "consistently",
    "every day",
    "habit",
    "regularly",
    "each morning",
];
const DECISION_CUES: &[&str] = &["decide", "evaluate", "option", "choose", "trade-off", "weigh"];
const LEARNING_CUES: &[&str] = &["learn", "study", "skill", "course", "practice", "understand"];
const OPTIMIZATION_CUES: &[&str] = &[
    "improve",
    "optimize",
    "optimise",
    "automate",
    "streamline",
    "efficien",
];

/// Evidence counts above these each add a confidence bonus
const EVIDENCE_BONUS_THRESHOLDS: [usize; 2] = [2, 3];
const CONFIDENCE_BONUS: f64 = 0.1;
const RECENT_WINDOW_DAYS: i64 = 7;

/// A candidate recommendation type mined from one insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationOpportunity {
    pub insight_id: String,
    pub insight: Insight,
    pub opportunity_type: RecommendationType,
    pub confidence: f64,
    pub reasoning: String,
    pub suggested_actions: Vec<String>,
    pub potential_impact: String,
    pub implementation_notes: String,
}

/// Lexical cues in an insight description and the type each one signals
fn cue_table() -> [(RecommendationType, &'static [&'static str]); 5] {
    [
        (RecommendationType::Action, ACTION_CUES),
        (RecommendationType::Habit, HABIT_CUES),
        (RecommendationType::Decision, DECISION_CUES),
        (RecommendationType::Learning, LEARNING_CUES),
        (RecommendationType::Optimization, OPTIMIZATION_CUES),
    ]
}

/// Recommendation type implied by the insight category alone
pub fn category_opportunity(category: InsightCategory) -> Option<RecommendationType> {
    match category {
        InsightCategory::Wellbeing => Some(RecommendationType::Health),
        InsightCategory::Productivity => Some(RecommendationType::Productivity),
        InsightCategory::Goals => Some(RecommendationType::Career),
        InsightCategory::Learning => Some(RecommendationType::Reflection),
        InsightCategory::Relationships
        | InsightCategory::Habits
        | InsightCategory::Creativity
        | InsightCategory::Career
        | InsightCategory::Health
        | InsightCategory::Finance
        | InsightCategory::PersonalGrowth => None,
    }
}

fn suggested_actions(opportunity_type: RecommendationType) -> Vec<String> {
    let actions: &[&str] = match opportunity_type {
        RecommendationType::Action => &["Define the first concrete step", "Schedule time to do it"],
        RecommendationType::Habit => &[
            "Pick a consistent trigger",
            "Start with a small daily version",
            "Track streaks for two weeks",
        ],
        RecommendationType::Decision => &[
            "List the available options",
            "Write down the criteria that matter",
            "Set a date to decide",
        ],
        RecommendationType::Learning => &[
            "Choose one resource",
            "Block regular study sessions",
            "Apply what you learn to a small project",
        ],
        RecommendationType::Optimization => &[
            "Measure the current baseline",
            "Remove or automate one step",
            "Compare against the baseline",
        ],
        RecommendationType::Health => &["Notice when energy drops", "Plan one restorative break"],
        RecommendationType::Career => &[
            "Clarify the goal this supports",
            "Identify the next milestone",
        ],
        RecommendationType::Productivity => &[
            "Protect your most productive hours",
            "Batch similar tasks together",
        ],
        RecommendationType::Reflection => &[
            "Write a short reflection on what worked",
            "Note one thing to change",
        ],
        RecommendationType::Goal => &["State the goal in one sentence", "Set a review date"],
    };
    actions.iter().map(|a| a.to_string()).collect()
}

fn impact_level(importance: f64) -> &'static str {
    if importance > 0.7 {
        "High"
    } else if importance > 0.4 {
        "Moderate"
    } else {
        "Modest"
    }
}

/// Finds recommendation opportunities in insights
#[derive(Debug, Clone)]
pub struct OpportunityIdentifier {
    min_confidence: f64,
}

impl OpportunityIdentifier {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    /// Opportunity types signalled by one insight, deduplicated in discovery order
    pub fn opportunity_types(&self, insight: &Insight) -> Vec<(RecommendationType, String)> {
        let description = insight.description.to_lowercase();
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for (opportunity_type, cues) in cue_table() {
            if let Some(cue) = cues.iter().find(|cue| description.contains(*cue)) {
                if seen.insert(opportunity_type) {
                    found.push((
                        opportunity_type,
                        format!("Description mentions \"{}\"", cue),
                    ));
                }
            }
        }

        if let Some(opportunity_type) = category_opportunity(insight.category) {
            if seen.insert(opportunity_type) {
                found.push((
                    opportunity_type,
                    format!("{} insights call for {} recommendations", insight.category, opportunity_type),
                ));
            }
        }

        found
    }

    /// Insight confidence plus evidence and recency bonuses, capped at 1.0
    pub fn opportunity_confidence(&self, insight: &Insight, now: DateTime<Utc>) -> f64 {
        let mut confidence = insight.confidence;
        for threshold in EVIDENCE_BONUS_THRESHOLDS {
            if insight.evidence.len() > threshold {
                confidence += CONFIDENCE_BONUS;
            }
        }
        let window = Duration::days(RECENT_WINDOW_DAYS);
        let distance = now - insight.timeframe.end;
        if distance <= window && distance >= -window {
            confidence += CONFIDENCE_BONUS;
        }
        clamp01(confidence)
    }

    pub fn identify(&self, insights: &[Insight]) -> Vec<RecommendationOpportunity> {
        self.identify_at(insights, Utc::now())
    }

    /// Mine every insight relative to `now`, dropping low-confidence and
    /// duplicate (insight, type) opportunities.
    pub fn identify_at(
        &self,
        insights: &[Insight],
        now: DateTime<Utc>,
    ) -> Vec<RecommendationOpportunity> {
        let mut seen: HashSet<(String, RecommendationType)> = HashSet::new();
        let mut opportunities = Vec::new();

        for insight in insights {
            let confidence = self.opportunity_confidence(insight, now);
            for (opportunity_type, reasoning) in self.opportunity_types(insight) {
                if confidence < self.min_confidence {
                    debug!(
                        "Skipping {} opportunity for {}: confidence {:.2} below {:.2}",
                        opportunity_type, insight.id, confidence, self.min_confidence
                    );
                    continue;
                }
                if !seen.insert((insight.id.clone(), opportunity_type)) {
                    continue;
                }
                opportunities.push(RecommendationOpportunity {
                    insight_id: insight.id.clone(),
                    insight: insight.clone(),
                    opportunity_type,
                    confidence,
                    reasoning,
                    suggested_actions: suggested_actions(opportunity_type),
                    potential_impact: format!(
                        "{} impact on {}",
                        impact_level(insight.importance),
                        insight.category
                    ),
                    implementation_notes: format!(
                        "Based on {} evidence item(s) with actionability {:.2}",
                        insight.evidence.len(),
                        insight.actionability
                    ),
                });
            }
        }

        opportunities
    }
}
