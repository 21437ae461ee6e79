//! Markdown and JSON report generation.
//!
//! This module renders the analyzer's findings as a Markdown document or
//! as pretty-printed JSON.

use crate::models::{Finding, Report, ReportMetadata};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# GitHub Census Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_findings_section(&report.findings));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Users:** {} (`{}`)\n",
        metadata.user_count,
        metadata.users_path.display()
    ));
    section.push_str(&format!(
        "- **Repositories:** {} (`{}`)\n",
        metadata.repository_count,
        metadata.repositories_path.display()
    ));
    if !metadata.location.is_empty() {
        section.push_str(&format!("- **Location filter:** {}\n", metadata.location));
    }
    section.push_str(&format!("- **Cohort cutoff:** {}\n", metadata.cohort_cutoff));
    section.push('\n');

    section
}

/// Generate the findings table.
fn generate_findings_section(findings: &[Finding]) -> String {
    let mut section = String::new();

    section.push_str("## Findings\n\n");

    if findings.is_empty() {
        section.push_str("No questions were answered.\n\n");
        return section;
    }

    section.push_str("| Key | Question | Answer |\n");
    section.push_str("|:---|:---|:---|\n");

    for finding in findings {
        section.push_str(&format!(
            "| `{}` | {} | {} |\n",
            finding.key,
            escape_cell(&finding.question),
            escape_cell(&finding.answer)
        ));
    }
    section.push('\n');

    section
}

/// Pipes would split a Markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn generate_footer() -> String {
    "---\n\n*Report generated by ghcensus*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
