//! Command handlers
//!
//! Each handler loads its inputs, drives the engine and returns the rendered
//! output so the caller decides where it goes.

use advisor_core::config::AdvisorConfig;
use advisor_core::types::{AnalysisContext, ContextualFactors, Insight};
use advisor_engine::recommendation::create_pipeline_with_config;
use advisor_engine::{Domain, InsightPrioritizationEngine, TemplateRegistry};
use anyhow::{anyhow, Context, Result};
use log::info;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::args::{InsightArgs, RecommendArgs, TemplateAction};
use crate::completion::CommandCompletionEngine;
use crate::output::{self, OutputOptions};

/// Read a JSON array of insights
pub fn load_insights<P: AsRef<Path>>(path: P) -> Result<Vec<Insight>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read insights file {}", path.display()))?;
    let insights: Vec<Insight> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse insights file {}", path.display()))?;
    info!("Loaded {} insights from {}", insights.len(), path.display());
    Ok(insights)
}

/// Configuration from `path`, or the domain defaults when no file is given
pub fn load_config(path: Option<&str>, domain: Domain) -> Result<AdvisorConfig> {
    match path {
        Some(path) => Ok(AdvisorConfig::load_from_file(path)?),
        None => Ok(domain.config()),
    }
}

fn analysis_context(args: &InsightArgs) -> AnalysisContext {
    AnalysisContext::new(args.purpose, args.audience).with_factors(ContextualFactors {
        stress_level: args.stress,
        available_time: args.available_time,
        ..ContextualFactors::default()
    })
}

fn output_options(base: &OutputOptions, args: &InsightArgs) -> OutputOptions {
    OutputOptions {
        verbose: args.verbose,
        ..base.clone()
    }
}

pub fn prioritize(
    mut config: AdvisorConfig,
    args: &InsightArgs,
    options: &OutputOptions,
) -> Result<String> {
    if let Some(max) = args.max {
        config.prioritization.max_insights = max;
    }
    let insights = load_insights(&args.insights)?;
    let engine = InsightPrioritizationEngine::new(config.prioritization)?;
    let result = engine.prioritize_insights(&insights, &analysis_context(args))?;
    output::format_prioritization(&result, &output_options(options, args))
}

pub async fn recommend(
    domain: Domain,
    mut config: AdvisorConfig,
    args: &RecommendArgs,
    options: &OutputOptions,
) -> Result<String> {
    if let Some(max) = args.input.max {
        config.generation.max_recommendations = max;
    }
    if args.no_fallback {
        config.generation.fallback_to_templates = false;
    }
    if args.deadline_ms.is_some() {
        config.generation.deadline_ms = args.deadline_ms;
    }
    if args.ai_command.is_some() {
        config.generation.enable_ai_generation = true;
    }

    let insights = load_insights(&args.input.insights)?;
    let mut pipeline = create_pipeline_with_config(domain, config)?;
    if let Some(program) = &args.ai_command {
        pipeline = pipeline.with_completion_engine(Arc::new(CommandCompletionEngine::new(
            program.clone(),
            args.ai_args.clone(),
        )));
    }

    let result = pipeline
        .generate_recommendations(&insights, &analysis_context(&args.input), None)
        .await;
    output::format_recommendations(&result, &output_options(options, &args.input))
}

pub fn templates(domain: Domain, action: &TemplateAction, options: &OutputOptions) -> Result<String> {
    let registry: TemplateRegistry = domain.registry()?;
    match action {
        TemplateAction::List => output::format_templates(&registry.list_templates(), options),
        TemplateAction::Show { id } => {
            let template = registry
                .get_template(id)
                .ok_or_else(|| anyhow!("No template with id '{}' in the {} domain", id, domain))?;
            output::format_template(&template, options)
        }
    }
}
