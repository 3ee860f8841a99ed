//! Terminal and JSON rendering of results

use advisor_core::recommendation::GeneratedRecommendation;
use advisor_engine::recommendation::RecommendationTemplate;
use advisor_engine::{PrioritizationResult, RecommendationGenerationResult};
use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub no_color: bool,
    pub verbose: bool,
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn heading(text: &str, options: &OutputOptions) -> String {
    if options.no_color {
        text.to_string()
    } else {
        text.bold().cyan().to_string()
    }
}

fn label(text: &str, options: &OutputOptions) -> String {
    if options.no_color {
        text.to_string()
    } else {
        text.dimmed().to_string()
    }
}

fn warning_lines(out: &mut String, warnings: &[String], options: &OutputOptions) {
    for warning in warnings {
        let prefix = if options.no_color {
            "Warning:".to_string()
        } else {
            "Warning:".yellow().to_string()
        };
        let _ = writeln!(out, "{} {}", prefix, warning);
    }
}

pub fn format_prioritization(result: &PrioritizationResult, options: &OutputOptions) -> Result<String> {
    if options.json {
        return to_json(result);
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        heading(
            &format!("{} insights selected", result.selected_insights.len()),
            options
        )
    );
    for insight in &result.selected_insights {
        let score = result
            .score_for(&insight.id)
            .map(|s| format!("{:.3}", s.total_score))
            .unwrap_or_else(|| "-".to_string());
        let rank = result.score_for(&insight.id).map(|s| s.rank).unwrap_or(0);
        let _ = writeln!(
            out,
            "{:>3}. {} [{} / {}] {}",
            rank,
            insight.title,
            insight.category,
            insight.insight_type,
            label(&format!("score {}", score), options)
        );
        if options.verbose {
            if let Some(s) = result.score_for(&insight.id) {
                let c = &s.components;
                let _ = writeln!(
                    out,
                    "     confidence {:.2} importance {:.2} actionability {:.2} novelty {:.2} recency {:.2} frequency {:.2}",
                    c.confidence, c.importance, c.actionability, c.novelty, c.recency, c.frequency
                );
            }
        }
    }

    if options.verbose && !result.rejected.is_empty() {
        let _ = writeln!(out, "\n{}", heading("Rejected", options));
        for rejected in &result.rejected {
            let _ = writeln!(out, "  {} {}", rejected.insight_id, label(&rejected.reason, options));
        }
    }

    let _ = writeln!(
        out,
        "\n{} {:.3}  {} {:.2}  {} {}ms",
        label("diversity", options),
        result.diversity_index,
        label("avg confidence", options),
        result.average_confidence,
        label("time", options),
        result.processing_time_ms
    );
    warning_lines(&mut out, &result.warnings, options);
    Ok(out)
}

fn format_recommendation(out: &mut String, rec: &GeneratedRecommendation, options: &OutputOptions) {
    let _ = writeln!(
        out,
        "\n{} {}",
        heading(&rec.title, options),
        label(
            &format!(
                "({} / {} / {})",
                rec.recommendation_type, rec.urgency, rec.generation_method
            ),
            options
        )
    );
    let _ = writeln!(out, "  {}", rec.description);
    for step in &rec.action_steps {
        let _ = writeln!(out, "  {}. {}", step.order, step.description);
    }
    if options.verbose {
        let _ = writeln!(
            out,
            "  {} confidence {:.2} relevance {:.2} impact {:.2} feasibility {:.2}",
            label("scores", options),
            rec.confidence,
            rec.relevance_score,
            rec.impact_potential,
            rec.feasibility_score
        );
        let _ = writeln!(
            out,
            "  {} {} ({}), review {}",
            label("difficulty", options),
            rec.difficulty,
            rec.timeframe,
            rec.review_timeframe
        );
        let _ = writeln!(
            out,
            "  {} {}",
            label("from", options),
            rec.source_insights.join(", ")
        );
    }
}

pub fn format_recommendations(
    result: &RecommendationGenerationResult,
    options: &OutputOptions,
) -> Result<String> {
    if options.json {
        return to_json(result);
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        heading(
            &format!(
                "{} recommendations from {} of {} opportunities",
                result.recommendations_generated,
                result.opportunities_processed,
                result.total_opportunities
            ),
            options
        )
    );
    for rec in &result.recommendations {
        format_recommendation(&mut out, rec, options);
    }

    if !result.quick_wins.is_empty() {
        let _ = writeln!(out, "\n{} {}", label("Quick wins:", options), result.quick_wins.join(", "));
    }
    if !result.long_term_goals.is_empty() {
        let _ = writeln!(
            out,
            "{} {}",
            label("Long-term goals:", options),
            result.long_term_goals.join(", ")
        );
    }
    if options.verbose {
        for cluster in &result.clusters {
            let _ = writeln!(
                out,
                "{} {} ({} recommendations, impact {:.2})",
                label("Cluster", options),
                cluster.theme,
                cluster.recommendations.len(),
                cluster.combined_impact
            );
        }
    }

    let _ = writeln!(
        out,
        "\n{} {:.2}  {} {:.2}  {} {}ms",
        label("avg confidence", options),
        result.average_confidence,
        label("diversity", options),
        result.diversity_score,
        label("time", options),
        result.generation_time_ms
    );
    warning_lines(&mut out, &result.warnings, options);
    Ok(out)
}

pub fn format_templates(templates: &[RecommendationTemplate], options: &OutputOptions) -> Result<String> {
    if options.json {
        return to_json(&templates);
    }
    let mut out = String::new();
    for template in templates {
        let category = template
            .category
            .map(|c| c.to_string())
            .unwrap_or_else(|| "any".to_string());
        let _ = writeln!(
            out,
            "{:<28} {:<13} {:<14} {}",
            template.id,
            template.recommendation_type,
            category,
            label(&format!("effectiveness {:.2}", template.effectiveness), options)
        );
    }
    Ok(out)
}

pub fn format_template(template: &RecommendationTemplate, options: &OutputOptions) -> Result<String> {
    if options.json {
        return to_json(template);
    }
    let mut out = String::new();
    let _ = writeln!(out, "{}", heading(&template.id, options));
    let _ = writeln!(out, "{} {}", label("type", options), template.recommendation_type);
    let _ = writeln!(out, "{} {}", label("title", options), template.title_template);
    let _ = writeln!(out, "{} {}", label("description", options), template.description_template);
    for (i, step) in template.action_steps_template.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, step);
    }
    let _ = writeln!(out, "{} {}", label("variables", options), template.variables.join(", "));
    let _ = writeln!(
        out,
        "{} {:.2}  {} {}",
        label("minimum confidence", options),
        template.minimum_confidence,
        label("variations", options),
        template.variations.len()
    );
    Ok(out)
}
