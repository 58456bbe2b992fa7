//! Human-readable output

use owo_colors::OwoColorize;
use theorem_common::{FinalAnswer, KnowledgeTable, WorkflowResult};
use theorem_engine::{BatchEntry, BatchReport};

/// Entries listed under each heading of a batch summary
const SUMMARY_LIMIT: usize = 5;

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

fn stage_list(result: &WorkflowResult) -> String {
    result
        .workflow_used
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub fn print_result(result: &WorkflowResult) {
    if !result.success {
        println!(
            "{}  Failed: {}",
            "[-]".red(),
            result.error.as_deref().unwrap_or("unknown error")
        );
        return;
    }

    let workflow = result.workflow.map(|w| w.as_str()).unwrap_or("-");
    println!("{}  Success ({}: {})", "[+]".green(), workflow, stage_list(result));

    match &result.final_answer {
        Some(FinalAnswer::Reasoned(reasoning)) => {
            println!("    Answer:     {}", reasoning.answer.bold());
            println!("    Method:     {}", reasoning.method);
            println!("    Confidence: {:.0}%", reasoning.confidence * 100.0);
            if !reasoning.concepts_applied.is_empty() {
                println!("    Concepts:   {}", reasoning.concepts_applied.join(", "));
            }
        }
        Some(FinalAnswer::KnowledgeOnly(bundle)) => {
            println!("    Method:     knowledge_only");
            println!("    Coverage:   {:.0}%", bundle.coverage * 100.0);
            for concept in &bundle.concepts {
                match bundle.fact(concept).and_then(|r| r.definition()) {
                    Some(definition) => println!("    - {}: {}", concept.cyan(), definition),
                    None => println!("    - {}: (no definition)", concept.cyan()),
                }
            }
        }
        None => {}
    }
    println!("    Time:       {} ms", result.duration_ms);
}

fn print_entry_line(position: usize, entry: &BatchEntry) {
    println!(
        "  {}. {} (workflow: {})",
        position + 1,
        preview(&entry.result.question, 50),
        stage_list(&entry.result)
    );
}

pub fn print_report(report: &BatchReport) {
    for entry in &report.entries {
        let question = preview(&entry.result.question, 80);
        if entry.result.success {
            let answer = entry
                .result
                .final_answer
                .as_ref()
                .map(|a| (a.answer().unwrap_or("N/A"), a.method_label()))
                .unwrap_or(("N/A", "N/A"));
            println!(
                "{}  #{} {} -> {} ({})",
                "[+]".green(),
                entry.index + 1,
                question,
                answer.0.bold(),
                answer.1
            );
        } else {
            println!(
                "{}  #{} {} -> {}",
                "[-]".red(),
                entry.index + 1,
                question,
                entry.result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    println!();
    println!(
        "Summary: {}/{} successful, {} failed ({} ms, run {})",
        report.succeeded(),
        report.total(),
        report.failed(),
        report.duration_ms,
        report.run_id
    );

    let failures = report.failures(SUMMARY_LIMIT);
    if !failures.is_empty() {
        println!("\nFirst failures:");
        for (i, entry) in failures.iter().enumerate() {
            println!("  {}. {}", i + 1, preview(&entry.result.question, 50));
        }
    }

    let successes = report.successes(SUMMARY_LIMIT);
    if !successes.is_empty() {
        println!("\nFirst successes:");
        for (i, entry) in successes.iter().enumerate() {
            print_entry_line(i, entry);
        }
    }
}

pub fn print_concepts(table: &KnowledgeTable) {
    println!("Knowledge table v{} ({} concepts)", table.version(), table.len());
    for entry in table.entries() {
        let fields: Vec<&str> = entry.facts.fields().collect();
        if entry.triggers.is_empty() {
            println!("  {}  [{}]", entry.name.cyan(), fields.join(", "));
        } else {
            println!(
                "  {}  [{}]  triggers: {}",
                entry.name.cyan(),
                fields.join(", "),
                entry.triggers.join(", ")
            );
        }
    }
}
