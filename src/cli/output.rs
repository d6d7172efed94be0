//! Output formatting for CLI commands.
//!
//! This module handles formatting output as either JSON or human-readable text.

use std::path::Path;

use anyhow::Result;
use scout::{ClassificationResult, PrepareStats};

/// Print a classification result.
pub fn print_classification(query: &str, result: &ClassificationResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("Query: {}", query);
    if result.is_follow_up {
        println!("Follow-up: yes");
    }
    if let Some(rewrite) = &result.query_rewrite {
        println!("Rewrite: {}", rewrite);
    }
    if let Some(answer) = &result.answer {
        println!("Answer: {}", answer);
        return Ok(());
    }

    if let Some(query_type) = result.query_type {
        println!("Type: {}", query_type);
    }

    let filters = &result.filters;
    match (filters.app, filters.entity) {
        (Some(app), Some(entity)) => println!("Source: {} / {}", app, entity),
        (Some(app), None) => println!("Source: {}", app),
        _ => println!("Source: any"),
    }
    if let Some(direction) = result.temporal_direction {
        println!("Direction: {:?}", direction);
    }
    if let Some(keywords) = &result.filter_query {
        println!("Keywords: {}", keywords);
    }
    if let Some(count) = filters.count {
        println!("Count: {}", count);
    }
    if filters.start_time.is_some() || filters.end_time.is_some() {
        println!(
            "Window: {} .. {}",
            filters.start_time.as_deref().unwrap_or("open"),
            filters.end_time.as_deref().unwrap_or("open")
        );
    }
    if let Some(sort) = filters.sort_direction {
        println!("Sort: {:?}", sort);
    }
    if !filters.intent.is_empty() {
        println!("Intent: {}", serde_json::to_string(&filters.intent)?);
    }

    Ok(())
}

/// Print batch preparation statistics.
pub fn print_prepare_stats(stats: &PrepareStats, output: &Path, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
    } else {
        println!("Prepared {} examples -> {}", stats.total, output.display());
        println!(
            "Time references: {} ({} normalized, {} kept after failure)",
            stats.time_references, stats.normalized, stats.failed
        );
        if stats.flagged > 0 {
            println!("Records breaking routing invariants: {}", stats.flagged);
        }
    }
    Ok(())
}
