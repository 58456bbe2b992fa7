//! Command implementations

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use theorem_common::{load_dataset, KnowledgeTable, OllamaClient, TheoremConfig};
use theorem_engine::{evaluate, Coordinator};
use tracing::{info, warn};

use crate::output;

/// Exit code when the question could not be processed
const EXIT_QUESTION_FAILED: i32 = 1;

fn load_table(config: &TheoremConfig) -> Result<Arc<KnowledgeTable>> {
    let table = match &config.knowledge.path {
        Some(path) => KnowledgeTable::from_json_file(path)
            .with_context(|| format!("Failed to load knowledge table {}", path.display()))?,
        None => KnowledgeTable::builtin(),
    };
    Ok(Arc::new(table))
}

async fn build_coordinator(config: &TheoremConfig) -> Result<Coordinator> {
    let table = load_table(config)?;
    let model = OllamaClient::new(config.model.clone()).context("Failed to create model client")?;
    if !config.model.enabled {
        warn!("Model disabled; questions without a matching rule will answer ERROR");
    } else if !model.is_available().await {
        warn!(
            "Ollama not reachable at {}; questions without a matching rule will answer ERROR",
            config.model.endpoint
        );
    }
    info!(
        "Using model {} at {} (knowledge table v{})",
        config.model.model,
        config.model.endpoint,
        table.version()
    );
    Ok(Coordinator::new(table, Arc::new(model), &config.reasoning))
}

pub async fn solve(config: &TheoremConfig, question: &str, json: bool) -> Result<()> {
    let coordinator = build_coordinator(config).await?;
    let result = coordinator.solve(question).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        output::print_result(&result);
    }

    if !result.success {
        std::process::exit(EXIT_QUESTION_FAILED);
    }
    Ok(())
}

pub async fn eval(
    config: &TheoremConfig,
    dataset: &Path,
    samples: Option<usize>,
    concurrency: Option<usize>,
    json: bool,
) -> Result<()> {
    let items = load_dataset(dataset)
        .with_context(|| format!("Failed to load dataset {}", dataset.display()))?;
    let available = items.len();
    let samples = samples.unwrap_or(config.batch.samples);
    let concurrency = concurrency.unwrap_or(config.batch.concurrency);
    let items: Vec<_> = items.into_iter().take(samples).collect();

    info!(
        "Loaded {} questions from {}, evaluating {}",
        available,
        dataset.display(),
        items.len()
    );

    let coordinator = Arc::new(build_coordinator(config).await?);
    let report = evaluate(coordinator, items, concurrency).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_report(&report);
    }
    Ok(())
}

pub fn knowledge(config: &TheoremConfig, concept: Option<&str>) -> Result<()> {
    let table = load_table(config)?;

    match concept {
        None => output::print_concepts(&table),
        Some(name) => {
            let record = table
                .lookup(name)
                .with_context(|| format!("Unknown concept '{}'", name))?;
            println!("{}", serde_json::to_string_pretty(record)?);
        }
    }
    Ok(())
}

pub fn show_config(config: &TheoremConfig) -> Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}
