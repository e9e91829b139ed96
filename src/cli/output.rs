//! Output formatting for CLI commands.
//!
//! Supports text tables and JSON output formats.

use crate::chunking::ChunkerResult;
use crate::core::PerformanceReport;
use crate::error::Error;
use crate::evaluation::{ComparisonRow, RowMetrics, SweepResult};
use crate::store::ScoredRow;
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Formats the strategy type list.
#[must_use]
pub fn format_strategies(types: &[(&str, &str)], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::from("Available strategies:\n");
            for (name, description) in types {
                let _ = writeln!(output, "  {name:<12} {description}");
            }
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct StrategyType<'a> {
                name: &'a str,
                description: &'a str,
            }
            let list: Vec<StrategyType<'_>> = types
                .iter()
                .map(|&(name, description)| StrategyType { name, description })
                .collect();
            format_json(&list)
        }
    }
}

#[derive(Serialize)]
struct RowJson<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<&'a RowMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<'a> From<&'a ComparisonRow> for RowJson<'a> {
    fn from(row: &'a ComparisonRow) -> Self {
        Self {
            name: &row.name,
            metrics: row.outcome.as_ref().ok(),
            error: row.outcome.as_ref().err().map(String::as_str),
        }
    }
}

/// Formats a strategy comparison.
#[must_use]
pub fn format_comparison(rows: &[ComparisonRow], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::from("Chunking Strategy Comparison\n\n");
            output.push_str(&comparison_table(rows, false));
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Comparison<'a> {
                rows: Vec<RowJson<'a>>,
            }
            format_json(&Comparison {
                rows: rows.iter().map(RowJson::from).collect(),
            })
        }
    }
}

/// Formats a judged comparison and its best strategy.
#[must_use]
pub fn format_evaluation(
    rows: &[ComparisonRow],
    best: Option<&ComparisonRow>,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::from("Chunking Evaluation Results\n\n");
            output.push_str(&comparison_table(rows, true));
            match best.and_then(|row| row.metrics().map(|m| (row, m))) {
                Some((row, metrics)) => {
                    let _ = writeln!(output, "\nBest performing strategy: {}", row.name);
                    if let Some(scores) = metrics.scores {
                        let _ = writeln!(output, "- Time:         {:.2} s", scores.elapsed_s);
                        let _ = writeln!(output, "- Faithfulness: {:.2}", scores.faithfulness);
                        let _ = writeln!(output, "- Relevancy:    {:.2}", scores.relevancy);
                    }
                    let _ = writeln!(output, "- Chunks:       {}", metrics.report.chunks_created);
                    let _ = writeln!(output, "- Avg size:     {:.0}", metrics.report.average_chunk_size);
                }
                None => output.push_str("\nNo strategy could be evaluated.\n"),
            }
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Evaluation<'a> {
                rows: Vec<RowJson<'a>>,
                best: Option<&'a str>,
            }
            format_json(&Evaluation {
                rows: rows.iter().map(RowJson::from).collect(),
                best: best.map(|row| row.name.as_str()),
            })
        }
    }
}

fn comparison_table(rows: &[ComparisonRow], judged: bool) -> String {
    let mut output = String::new();
    let _ = write!(
        output,
        "{:<22} {:>7} {:>11} {:>9} {:>12} {:>8} {:>16} {:>12}",
        "Strategy",
        "Chunks",
        "Chunks/sec",
        "Avg Size",
        "Memory (MB)",
        "Overlap",
        "Sentences/Chunk",
        "Words/Chunk"
    );
    if judged {
        let _ = write!(output, " {:>13} {:>10} {:>7}", "Faithfulness", "Relevancy", "Score");
    }
    output.push('\n');
    output.push_str(&"-".repeat(if judged { 136 } else { 104 }));
    output.push('\n');

    for row in rows {
        let name = truncate(&row.name, 22);
        match &row.outcome {
            Ok(metrics) => {
                let report = &metrics.report;
                let _ = write!(
                    output,
                    "{:<22} {:>7} {:>11.1} {:>9.1} {:>12.2} {:>8} {:>16.1} {:>12.1}",
                    name,
                    report.chunks_created,
                    report.chunks_per_second(),
                    report.average_chunk_size,
                    report.memory_delta_mb(),
                    overlap_cell(report),
                    report.chunk_stats.avg_sentences,
                    report.chunk_stats.avg_words,
                );
                if judged {
                    match metrics.scores {
                        Some(s) => {
                            let _ = write!(
                                output,
                                " {:>13.2} {:>10.2} {:>7.2}",
                                s.faithfulness,
                                s.relevancy,
                                s.combined()
                            );
                        }
                        None => {
                            let _ = write!(output, " {:>13} {:>10} {:>7}", "-", "-", "-");
                        }
                    }
                }
                output.push('\n');
            }
            Err(message) => {
                let _ = writeln!(output, "{name:<22} error: {message}");
            }
        }
    }
    output
}

fn overlap_cell(report: &PerformanceReport) -> String {
    report
        .overlap
        .map_or_else(|| "-".to_string(), |o| format!("{:.1}", o.average))
}

/// Formats a single strategy run with sample chunks.
#[must_use]
pub fn format_run(
    name: &str,
    result: &ChunkerResult,
    samples: usize,
    preview_len: usize,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => format_run_text(name, result, samples, preview_len),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Run<'a> {
                strategy: &'a str,
                report: &'a PerformanceReport,
                samples: Vec<&'a str>,
            }
            format_json(&Run {
                strategy: name,
                report: &result.report,
                samples: result
                    .chunks
                    .iter()
                    .take(samples)
                    .map(|c| c.preview(preview_len))
                    .collect(),
            })
        }
    }
}

fn format_run_text(name: &str, result: &ChunkerResult, samples: usize, preview_len: usize) -> String {
    let report = &result.report;
    let mut output = String::new();
    let _ = writeln!(output, "Strategy: {name}\n");
    let _ = writeln!(output, "  Chunks:          {}", report.chunks_created);
    let _ = writeln!(output, "  Time:            {:.2} ms", report.total_time_ms);
    let _ = writeln!(output, "  Chunks/sec:      {:.1}", report.chunks_per_second());
    let _ = writeln!(output, "  Tokens:          {}", report.tokens_processed);
    let _ = writeln!(output, "  Avg size:        {:.1} tokens", report.average_chunk_size);
    let _ = writeln!(
        output,
        "  Size min/med/max: {}/{}/{}",
        report.size_distribution.min, report.size_distribution.median, report.size_distribution.max
    );
    let _ = writeln!(output, "  Memory:          {:.2} MB", report.memory_delta_mb());
    let _ = writeln!(
        output,
        "  Sentences/chunk: {:.1} (min {}, max {})",
        report.chunk_stats.avg_sentences, report.chunk_stats.min_sentences, report.chunk_stats.max_sentences
    );
    let _ = writeln!(
        output,
        "  Words/chunk:     {:.1} (min {}, max {})",
        report.chunk_stats.avg_words, report.chunk_stats.min_words, report.chunk_stats.max_words
    );
    if let Some(overlap) = &report.overlap {
        let _ = writeln!(
            output,
            "  Overlap:         {:.1} avg, {}-{} chars, ratio {:.3}",
            overlap.average, overlap.min, overlap.max, overlap.ratio
        );
    }
    if let Some(separators) = &report.separators {
        output.push_str("  Separators:\n");
        for usage in separators {
            let _ = writeln!(output, "    {:<8} {}", format!("{:?}", usage.separator), usage.count);
        }
    }
    if let Some(calls) = report.external_calls {
        let _ = writeln!(output, "  Embedding calls: {calls}");
    }

    if samples > 0 && !result.chunks.is_empty() {
        output.push_str("\nSample chunks:\n");
        for chunk in result.chunks.iter().take(samples) {
            let _ = writeln!(
                output,
                "\n[{}] ({} tokens)\n{}",
                chunk.index,
                chunk.token_count,
                chunk.preview(preview_len)
            );
        }
    }
    output
}

/// Formats chunk-size sweep results.
#[must_use]
pub fn format_sweep(results: &[SweepResult], best: Option<&SweepResult>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::from("Chunk Size Evaluation\n\n");
            let _ = writeln!(
                output,
                "{:>10} {:>7} {:>18} {:>13} {:>10}",
                "Chunk Size", "Chunks", "Response Time (s)", "Faithfulness", "Relevancy"
            );
            output.push_str(&"-".repeat(62));
            output.push('\n');
            for r in results {
                let _ = writeln!(
                    output,
                    "{:>10} {:>7} {:>18.2} {:>13.2} {:>10.2}",
                    r.chunk_size,
                    r.chunks,
                    r.average_response_time_s,
                    r.average_faithfulness,
                    r.average_relevancy
                );
            }
            if let Some(best) = best {
                let _ = writeln!(output, "\nBest chunk size: {}", best.chunk_size);
            }
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Sweep<'a> {
                results: &'a [SweepResult],
                best_chunk_size: Option<usize>,
            }
            format_json(&Sweep {
                results,
                best_chunk_size: best.map(|b| b.chunk_size),
            })
        }
    }
}

/// Formats the result of indexing a file.
#[must_use]
pub fn format_index(records: usize, db_path: &Path, embedder: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!(
            "Indexed {records} chunks into {} (embedder: {embedder})\n",
            db_path.display()
        ),
        OutputFormat::Json => format_json(&serde_json::json!({
            "records": records,
            "db_path": db_path.to_string_lossy(),
            "embedder": embedder,
        })),
    }
}

/// Formats hybrid search hits.
#[must_use]
pub fn format_search(query: &str, hits: &[ScoredRow], preview_len: usize, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if hits.is_empty() {
                return format!("No results for \"{query}\".\n");
            }
            let mut output = format!("Results for \"{query}\":\n");
            for (rank, hit) in hits.iter().enumerate() {
                let _ = writeln!(
                    output,
                    "\n{}. {} (score {:.4})\n   {}",
                    rank + 1,
                    hit.id,
                    hit.score,
                    truncate(&hit.content.replace('\n', " "), preview_len)
                );
            }
            output
        }
        OutputFormat::Json => format_json(&serde_json::json!({
            "query": query,
            "results": hits,
        })),
    }
}

/// Formats an error for the chosen output format.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => format_json(&serde_json::json!({
            "success": false,
            "error": error.to_string(),
        })),
    }
}

fn format_json<T: Serialize>(value: &T) -> String {
    let mut json = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    json.push('\n');
    json
}

/// Truncates to at most `max_len` characters, marking the cut with `...`.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    if max_len > 3 {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::QualityScores;

    fn ok_row(name: &str, scores: Option<QualityScores>) -> ComparisonRow {
        ComparisonRow {
            name: name.to_string(),
            outcome: Ok(RowMetrics {
                report: PerformanceReport {
                    chunks_created: 12,
                    average_chunk_size: 480.0,
                    total_time_ms: 100.0,
                    ..PerformanceReport::default()
                },
                scores,
            }),
        }
    }

    fn failed_row(name: &str) -> ComparisonRow {
        ComparisonRow {
            name: name.to_string(),
            outcome: Err("embedding failed".to_string()),
        }
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("other"), OutputFormat::Text);
    }

    #[test]
    fn test_comparison_table_columns() {
        let output = format_comparison(&[ok_row("Recursive", None), failed_row("Semantic")], OutputFormat::Text);
        for column in ["Strategy", "Chunks/sec", "Memory (MB)", "Sentences/Chunk", "Words/Chunk"] {
            assert!(output.contains(column), "missing column {column}");
        }
        assert!(output.contains("120.0"));
        assert!(output.contains("Semantic"));
        assert!(output.contains("error: embedding failed"));
        assert!(!output.contains("Faithfulness"));
    }

    #[test]
    fn test_comparison_json_rows() {
        let output = format_comparison(&[ok_row("A", None), failed_row("B")], OutputFormat::Json);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["rows"][0]["name"], "A");
        assert_eq!(json["rows"][0]["metrics"]["report"]["chunks_created"], 12);
        assert!(json["rows"][0].get("error").is_none());
        assert_eq!(json["rows"][1]["error"], "embedding failed");
    }

    #[test]
    fn test_evaluation_best() {
        let scores = QualityScores {
            elapsed_s: 2.0,
            faithfulness: 0.9,
            relevancy: 0.8,
        };
        let rows = vec![ok_row("Winner", Some(scores))];
        let output = format_evaluation(&rows, rows.first(), OutputFormat::Text);
        assert!(output.contains("Faithfulness"));
        assert!(output.contains("Best performing strategy: Winner"));

        let output = format_evaluation(&[failed_row("x")], None, OutputFormat::Text);
        assert!(output.contains("No strategy could be evaluated."));
    }

    #[test]
    fn test_sweep_json() {
        let results = [SweepResult {
            chunk_size: 256,
            chunks: 4,
            average_response_time_s: 1.5,
            average_faithfulness: 0.75,
            average_relevancy: 0.5,
        }];
        let output = format_sweep(&results, results.first(), OutputFormat::Json);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["best_chunk_size"], 256);
        assert_eq!(json["results"][0]["chunks"], 4);
    }

    #[test]
    fn test_search_text() {
        let hits = vec![ScoredRow {
            id: "chunk_3".to_string(),
            content: "rivers\ncarry sediment".to_string(),
            score: 0.0328,
        }];
        let output = format_search("sediment", &hits, 80, OutputFormat::Text);
        assert!(output.contains("1. chunk_3"));
        assert!(output.contains("rivers carry sediment"));
        assert!(format_search("none", &[], 80, OutputFormat::Text).contains("No results"));
    }

    #[test]
    fn test_format_error_json() {
        let output = format_error(&Error::config("OPENAI_API_KEY is required"), OutputFormat::Json);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }
}
