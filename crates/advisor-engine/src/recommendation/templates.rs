//! Recommendation templates and the registry that holds them

use advisor_core::error::{AdvisorError, AdvisorResult};
use advisor_core::recommendation::{Directness, RecommendationType};
use advisor_core::types::{
    AnalysisContext, Audience, AvailableTime, InsightCategory, InsightType, StressLevel,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use strum::{Display, EnumString};

use super::opportunity::RecommendationOpportunity;
use super::renderer::placeholders;

/// Variables every template can rely on being extracted
pub const INSIGHT_TOPIC: &str = "insight_topic";
pub const INSIGHT_DESCRIPTION: &str = "insight_description";
pub const SUGGESTED_OUTCOME: &str = "suggested_outcome";
pub const CATEGORY: &str = "category";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum UsageFrequency {
    Rare,
    #[default]
    Occasional,
    Frequent,
    Daily,
}

/// When a variation applies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum VariationCondition {
    ConfidenceAbove(f64),
    ConfidenceBelow(f64),
    StressLevel(StressLevel),
    AvailableTime(AvailableTime),
    Audience(Audience),
}

impl VariationCondition {
    pub fn matches(&self, confidence: f64, context: &AnalysisContext) -> bool {
        match self {
            VariationCondition::ConfidenceAbove(threshold) => confidence > *threshold,
            VariationCondition::ConfidenceBelow(threshold) => confidence < *threshold,
            VariationCondition::StressLevel(level) => context.factors.stress_level == Some(*level),
            VariationCondition::AvailableTime(time) => {
                context.factors.available_time == Some(*time)
            }
            VariationCondition::Audience(audience) => context.audience == *audience,
        }
    }
}

/// Conditional override of a template's wording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVariation {
    pub condition: VariationCondition,
    #[serde(default)]
    pub title_template: Option<String>,
    #[serde(default)]
    pub description_template: Option<String>,
    #[serde(default)]
    pub directness: Option<Directness>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationTemplate {
    pub id: String,
    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,
    /// `None` applies to every category
    #[serde(default)]
    pub category: Option<InsightCategory>,
    pub title_template: String,
    pub description_template: String,
    #[serde(default)]
    pub action_steps_template: Vec<String>,
    /// Empty applies to every insight type
    #[serde(default)]
    pub applicable_insight_types: Vec<InsightType>,
    #[serde(default)]
    pub minimum_confidence: f64,
    /// Minimum number of evidence items on the source insight
    #[serde(default)]
    pub required_evidence: usize,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default)]
    pub variations: Vec<TemplateVariation>,
    #[serde(default)]
    pub usage_frequency: UsageFrequency,
    pub effectiveness: f64,
}

impl RecommendationTemplate {
    /// A template with the standard variables and no constraints
    pub fn new(
        id: impl Into<String>,
        recommendation_type: RecommendationType,
        title_template: impl Into<String>,
        description_template: impl Into<String>,
        action_steps_template: Vec<String>,
        effectiveness: f64,
    ) -> Self {
        Self {
            id: id.into(),
            recommendation_type,
            category: None,
            title_template: title_template.into(),
            description_template: description_template.into(),
            action_steps_template,
            applicable_insight_types: Vec::new(),
            minimum_confidence: 0.0,
            required_evidence: 0,
            variables: [INSIGHT_TOPIC, INSIGHT_DESCRIPTION, SUGGESTED_OUTCOME, CATEGORY]
                .iter()
                .map(|v| v.to_string())
                .collect(),
            variations: Vec::new(),
            usage_frequency: UsageFrequency::default(),
            effectiveness,
        }
    }

    pub fn with_category(mut self, category: InsightCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_applicable_types(mut self, types: Vec<InsightType>) -> Self {
        self.applicable_insight_types = types;
        self
    }

    pub fn with_minimum_confidence(mut self, minimum: f64) -> Self {
        self.minimum_confidence = minimum;
        self
    }

    pub fn with_variation(mut self, variation: TemplateVariation) -> Self {
        self.variations.push(variation);
        self
    }

    pub fn with_usage_frequency(mut self, frequency: UsageFrequency) -> Self {
        self.usage_frequency = frequency;
        self
    }

    /// Every template string: title, description, steps, then variation overrides
    fn texts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.title_template.as_str())
            .chain(std::iter::once(self.description_template.as_str()))
            .chain(self.action_steps_template.iter().map(String::as_str))
            .chain(self.variations.iter().flat_map(|v| {
                v.title_template
                    .as_deref()
                    .into_iter()
                    .chain(v.description_template.as_deref())
            }))
    }

    /// Structural checks run before registration
    pub fn validate(&self) -> AdvisorResult<()> {
        let field = |name: &str| format!("templates.{}.{}", self.id, name);
        if self.id.trim().is_empty() {
            return Err(AdvisorError::configuration("templates.id", "must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.effectiveness) {
            return Err(AdvisorError::configuration(
                field("effectiveness"),
                format!("must be within [0, 1], got {}", self.effectiveness),
            ));
        }
        if !(0.0..=1.0).contains(&self.minimum_confidence) {
            return Err(AdvisorError::configuration(
                field("minimum_confidence"),
                format!("must be within [0, 1], got {}", self.minimum_confidence),
            ));
        }
        if self.title_template.trim().is_empty() || self.description_template.trim().is_empty() {
            return Err(AdvisorError::configuration(
                field("title_template"),
                "title and description templates must not be empty",
            ));
        }

        let declared: BTreeSet<&str> = self.variables.iter().map(String::as_str).collect();
        for text in self.texts() {
            handlebars::Template::compile(text).map_err(|e| {
                AdvisorError::configuration(field("syntax"), e.to_string())
            })?;
            if let Some(undeclared) = placeholders(text)
                .into_iter()
                .find(|name| !declared.contains(name.as_str()))
            {
                return Err(AdvisorError::configuration(
                    field("variables"),
                    format!("placeholder '{}' is not declared", undeclared),
                ));
            }
        }
        Ok(())
    }

    /// Whether this template's constraints are met by an opportunity
    pub fn is_applicable(&self, opportunity: &RecommendationOpportunity) -> bool {
        let insight = &opportunity.insight;
        self.recommendation_type == opportunity.opportunity_type
            && (self.applicable_insight_types.is_empty()
                || self.applicable_insight_types.contains(&insight.insight_type))
            && opportunity.confidence >= self.minimum_confidence
            && insight.evidence.len() >= self.required_evidence
            && self.category.map_or(true, |c| c == insight.category)
    }

    /// First variation whose condition holds
    pub fn select_variation(
        &self,
        confidence: f64,
        context: &AnalysisContext,
    ) -> Option<&TemplateVariation> {
        self.variations
            .iter()
            .find(|v| v.condition.matches(confidence, context))
    }
}

/// Registry of recommendation templates, safe for concurrent readers.
///
/// Each pipeline owns its own registry; there is no process-wide instance.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: RwLock<BTreeMap<String, RecommendationTemplate>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with one general-purpose template per recommendation type
    pub fn with_default_templates() -> AdvisorResult<Self> {
        let registry = Self::new();
        for template in default_templates() {
            registry.add_template(template)?;
        }
        Ok(registry)
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, RecommendationTemplate>> {
        self.templates.read().unwrap_or_else(|poisoned| {
            warn!("Template registry lock poisoned, recovering data");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, RecommendationTemplate>> {
        self.templates.write().unwrap_or_else(|poisoned| {
            warn!("Template registry lock poisoned, recovering data");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Validate and register a template, replacing any with the same id
    pub fn add_template(&self, template: RecommendationTemplate) -> AdvisorResult<()> {
        template.validate()?;
        debug!(
            "Registering template {} ({})",
            template.id, template.recommendation_type
        );
        if let Some(previous) = self.write().insert(template.id.clone(), template) {
            info!("Replaced template {}", previous.id);
        }
        Ok(())
    }

    pub fn remove_template(&self, id: &str) -> Option<RecommendationTemplate> {
        let removed = self.write().remove(id);
        if removed.is_some() {
            debug!("Removed template {}", id);
        }
        removed
    }

    pub fn get_template(&self, id: &str) -> Option<RecommendationTemplate> {
        self.read().get(id).cloned()
    }

    /// Snapshot of all templates ordered by id
    pub fn list_templates(&self) -> Vec<RecommendationTemplate> {
        self.read().values().cloned().collect()
    }

    pub fn templates_for(&self, recommendation_type: RecommendationType) -> Vec<RecommendationTemplate> {
        self.read()
            .values()
            .filter(|t| t.recommendation_type == recommendation_type)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Highest-effectiveness template for the opportunity's type, preferring
    /// templates whose constraints the opportunity satisfies. Ties keep the
    /// lowest id.
    pub fn find_best_template(
        &self,
        opportunity: &RecommendationOpportunity,
    ) -> Option<RecommendationTemplate> {
        let guard = self.read();
        let templates: &BTreeMap<String, RecommendationTemplate> = &guard;
        let wanted = opportunity.opportunity_type;
        let of_type = move || {
            templates
                .values()
                .filter(move |t| t.recommendation_type == wanted)
        };

        most_effective(of_type().filter(|t| t.is_applicable(opportunity)))
            .or_else(|| most_effective(of_type()))
            .cloned()
    }

    pub fn update_effectiveness(&self, id: &str, effectiveness: f64) -> AdvisorResult<()> {
        if !(0.0..=1.0).contains(&effectiveness) {
            return Err(AdvisorError::configuration(
                format!("templates.{}.effectiveness", id),
                format!("must be within [0, 1], got {}", effectiveness),
            ));
        }
        let mut templates = self.write();
        let template = templates.get_mut(id).ok_or_else(|| {
            AdvisorError::configuration(format!("templates.{}", id), "no such template")
        })?;
        template.effectiveness = effectiveness;
        Ok(())
    }

    /// Drop every template
    pub fn clear(&self) {
        self.write().clear();
    }
}

fn most_effective<'a>(
    candidates: impl Iterator<Item = &'a RecommendationTemplate>,
) -> Option<&'a RecommendationTemplate> {
    candidates.fold(None, |best, t| match best {
        Some(b) if b.effectiveness >= t.effectiveness => Some(b),
        _ => Some(t),
    })
}

fn steps(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// One general-purpose template per recommendation type
pub fn default_templates() -> Vec<RecommendationTemplate> {
    use RecommendationType as R;

    vec![
        RecommendationTemplate::new(
            "action-next-step",
            R::Action,
            "Take the next step on {{insight_topic}}",
            "Your notes show: {{insight_description}}. Acting on it now should lead to {{suggested_outcome}}.",
            steps(&[
                "Write down the single next action for {{insight_topic}}",
                "Block 30 minutes in your calendar for it",
            ]),
            0.7,
        )
        .with_usage_frequency(UsageFrequency::Frequent)
        .with_variation(TemplateVariation {
            condition: VariationCondition::StressLevel(StressLevel::High),
            title_template: Some("One small step on {{insight_topic}}".to_string()),
            description_template: None,
            directness: Some(Directness::Suggestion),
        }),
        RecommendationTemplate::new(
            "habit-build-routine",
            R::Habit,
            "Build a routine around {{insight_topic}}",
            "A recurring pattern appears in your notes: {{insight_description}}. Turning it into a habit can bring {{suggested_outcome}}.",
            steps(&[
                "Pick a daily trigger for {{insight_topic}}",
                "Start with a two-minute version",
                "Track it for two weeks",
            ]),
            0.7,
        )
        .with_usage_frequency(UsageFrequency::Daily),
        RecommendationTemplate::new(
            "decision-weigh-options",
            R::Decision,
            "Make a clear decision about {{insight_topic}}",
            "An open choice shows up in your notes: {{insight_description}}. Deciding deliberately supports {{suggested_outcome}}.",
            steps(&[
                "List the options for {{insight_topic}}",
                "Score each option against what matters most",
                "Commit to a decision date",
            ]),
            0.65,
        ),
        RecommendationTemplate::new(
            "learning-focused-study",
            R::Learning,
            "Deepen your knowledge of {{insight_topic}}",
            "You noted: {{insight_description}}. Focused learning here could bring {{suggested_outcome}}.",
            steps(&[
                "Choose one resource on {{insight_topic}}",
                "Schedule weekly study sessions",
                "Apply one idea to a real task",
            ]),
            0.65,
        ),
        RecommendationTemplate::new(
            "optimization-streamline",
            R::Optimization,
            "Streamline {{insight_topic}}",
            "There is room to improve: {{insight_description}}. Optimizing it should give {{suggested_outcome}}.",
            steps(&[
                "Measure how {{insight_topic}} works today",
                "Remove or automate one step",
                "Compare results after a week",
            ]),
            0.65,
        ),
        RecommendationTemplate::new(
            "health-restore-energy",
            R::Health,
            "Look after your wellbeing around {{insight_topic}}",
            "Your notes point to a wellbeing signal: {{insight_description}}. Attending to it supports {{suggested_outcome}}.",
            steps(&[
                "Notice when {{insight_topic}} affects your energy",
                "Plan one restorative break each day",
            ]),
            0.6,
        )
        .with_category(InsightCategory::Wellbeing),
        RecommendationTemplate::new(
            "career-next-milestone",
            R::Career,
            "Advance your goals through {{insight_topic}}",
            "A goal-related theme emerged: {{insight_description}}. Working toward it can bring {{suggested_outcome}}.",
            steps(&[
                "Name the goal {{insight_topic}} supports",
                "Define the next milestone",
                "Share progress with someone you trust",
            ]),
            0.6,
        ),
        RecommendationTemplate::new(
            "productivity-protect-focus",
            R::Productivity,
            "Protect your focus for {{insight_topic}}",
            "Your productivity notes show: {{insight_description}}. Structuring your time around it supports {{suggested_outcome}}.",
            steps(&[
                "Identify your most productive hours",
                "Reserve them for {{insight_topic}}",
            ]),
            0.6,
        )
        .with_category(InsightCategory::Productivity),
        RecommendationTemplate::new(
            "reflection-review-learning",
            R::Reflection,
            "Reflect on what {{insight_topic}} taught you",
            "You recorded: {{insight_description}}. A short reflection helps consolidate it into {{suggested_outcome}}.",
            steps(&[
                "Write three sentences on what worked",
                "Note one thing to change next time",
            ]),
            0.55,
        ),
        RecommendationTemplate::new(
            "goal-set-intention",
            R::Goal,
            "Set a clear goal for {{insight_topic}}",
            "Your notes suggest a direction: {{insight_description}}. A written goal makes {{suggested_outcome}} more likely.",
            steps(&[
                "State the goal for {{insight_topic}} in one sentence",
                "Pick a review date",
            ]),
            0.55,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::types::Insight;

    fn opportunity(
        opportunity_type: RecommendationType,
        category: InsightCategory,
    ) -> RecommendationOpportunity {
        let insight = Insight::new("i-1", "t", "d", category, InsightType::Pattern);
        RecommendationOpportunity {
            insight_id: insight.id.clone(),
            insight,
            opportunity_type,
            confidence: 0.7,
            reasoning: String::new(),
            suggested_actions: Vec::new(),
            potential_impact: "High impact".to_string(),
            implementation_notes: String::new(),
        }
    }

    #[test]
    fn test_default_templates_cover_every_type() {
        use strum::IntoEnumIterator;
        let registry = TemplateRegistry::with_default_templates().unwrap();
        for recommendation_type in RecommendationType::iter() {
            assert!(
                !registry.templates_for(recommendation_type).is_empty(),
                "missing template for {}",
                recommendation_type
            );
        }
    }

    #[test]
    fn test_invalid_templates_rejected() {
        let registry = TemplateRegistry::new();
        let bad_effectiveness = RecommendationTemplate::new(
            "x",
            RecommendationType::Action,
            "t",
            "d",
            Vec::new(),
            1.2,
        );
        assert!(registry.add_template(bad_effectiveness).is_err());

        let bad_syntax = RecommendationTemplate::new(
            "y",
            RecommendationType::Action,
            "{{#if}}",
            "d",
            Vec::new(),
            0.5,
        );
        assert!(registry.add_template(bad_syntax).is_err());

        let undeclared = RecommendationTemplate::new(
            "z",
            RecommendationType::Action,
            "Hello {{mystery}}",
            "d",
            Vec::new(),
            0.5,
        );
        assert!(registry.add_template(undeclared).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_find_best_prefers_applicable_then_effectiveness() {
        let registry = TemplateRegistry::new();
        registry
            .add_template(
                RecommendationTemplate::new("a", RecommendationType::Health, "t", "d", vec![], 0.9)
                    .with_category(InsightCategory::Finance),
            )
            .unwrap();
        registry
            .add_template(RecommendationTemplate::new(
                "b",
                RecommendationType::Health,
                "t",
                "d",
                vec![],
                0.6,
            ))
            .unwrap();

        let wellbeing = opportunity(RecommendationType::Health, InsightCategory::Wellbeing);
        assert_eq!(registry.find_best_template(&wellbeing).unwrap().id, "b");

        registry.remove_template("b");
        assert_eq!(registry.find_best_template(&wellbeing).unwrap().id, "a");

        let habit = opportunity(RecommendationType::Habit, InsightCategory::Wellbeing);
        assert!(registry.find_best_template(&habit).is_none());
    }

    #[test]
    fn test_update_effectiveness() {
        let registry = TemplateRegistry::with_default_templates().unwrap();
        registry.update_effectiveness("goal-set-intention", 0.95).unwrap();
        assert_eq!(
            registry.get_template("goal-set-intention").unwrap().effectiveness,
            0.95
        );
        assert!(registry.update_effectiveness("goal-set-intention", -0.1).is_err());
        assert!(registry.update_effectiveness("missing", 0.5).is_err());
        registry.clear();
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_variation_selection() {
        let template = &default_templates()[0];
        let calm = AnalysisContext::default();
        assert!(template.select_variation(0.7, &calm).is_none());

        let mut stressed = AnalysisContext::default();
        stressed.factors.stress_level = Some(StressLevel::High);
        let variation = template.select_variation(0.7, &stressed).unwrap();
        assert_eq!(variation.directness, Some(Directness::Suggestion));
    }
}
