use crate::client::Endpoint;
use crate::model::{cve_summaries, match_summaries, CveSummary, PageInfo, Severity};
use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct CveRow {
    #[tabled(rename = "CVE")]
    id: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Published")]
    published: String,
    #[tabled(rename = "Description")]
    description: String,
}

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "Criteria")]
    criteria: String,
    #[tabled(rename = "Match Criteria ID")]
    match_criteria_id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "CPEs")]
    cpe_count: usize,
    #[tabled(rename = "Last Modified")]
    last_modified: String,
}

pub fn print_table(doc: &Value, endpoint: Endpoint) -> Result<()> {
    println!("{}", render_table(doc, endpoint));
    Ok(())
}

/// Renders the response as a table followed by paging and severity totals.
pub fn render_table(doc: &Value, endpoint: Endpoint) -> String {
    let mut out = String::new();
    let page = PageInfo::from_document(doc);

    match endpoint {
        Endpoint::Cves => {
            let cves = cve_summaries(doc);
            out.push_str(&page_line(&page, cves.len()));
            out.push('\n');
            if cves.is_empty() {
                out.push_str("No CVEs found.\n");
                return out;
            }

            let rows: Vec<CveRow> = cves
                .iter()
                .map(|c| CveRow {
                    id: c.id.clone(),
                    severity: format_severity(&c.severity),
                    score: c
                        .base_score
                        .map(|s| format!("{:.1}", s))
                        .unwrap_or_else(|| "-".to_string()),
                    status: or_dash(c.status.as_deref()),
                    published: or_dash(c.published.as_deref().map(date_part)),
                    description: truncate(c.description.as_deref().unwrap_or("-"), 60),
                })
                .collect();

            out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
            out.push('\n');
            out.push_str(&severity_line(&cves));
            out.push('\n');
        }
        Endpoint::CpeMatch => {
            let matches = match_summaries(doc);
            out.push_str(&page_line(&page, matches.len()));
            out.push('\n');
            if matches.is_empty() {
                out.push_str("No match strings found.\n");
                return out;
            }

            let rows: Vec<MatchRow> = matches
                .iter()
                .map(|m| MatchRow {
                    criteria: truncate(&m.criteria, 60),
                    match_criteria_id: or_dash(m.match_criteria_id.as_deref()),
                    status: or_dash(m.status.as_deref()),
                    cpe_count: m.cpe_count,
                    last_modified: or_dash(m.last_modified.as_deref().map(date_part)),
                })
                .collect();

            out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
            out.push('\n');
        }
    }

    out
}

fn page_line(page: &PageInfo, shown: usize) -> String {
    let start = page.start_index.unwrap_or(0);
    match page.total_results {
        Some(total) if shown > 0 => format!(
            "Showing {}-{} of {} results",
            start + 1,
            start + shown as u64,
            total
        ),
        Some(total) => format!("Showing 0 of {} results", total),
        None => format!("Showing {} results", shown),
    }
}

fn severity_line(cves: &[CveSummary]) -> String {
    let mut counts: BTreeMap<Severity, usize> = BTreeMap::new();
    for cve in cves {
        *counts.entry(cve.severity).or_default() += 1;
    }

    let parts: Vec<String> = counts
        .iter()
        .map(|(severity, count)| format!("{} {}", count, severity.as_str().to_lowercase()))
        .collect();
    format!("Severity: {}", parts.join(", "))
}

fn format_severity(severity: &Severity) -> String {
    match severity {
        Severity::Critical => "\x1b[31mCRITICAL\x1b[0m".to_string(),
        Severity::High => "\x1b[91mHIGH\x1b[0m".to_string(),
        Severity::Medium => "\x1b[33mMEDIUM\x1b[0m".to_string(),
        Severity::Low => "\x1b[32mLOW\x1b[0m".to_string(),
        other => other.as_str().to_string(),
    }
}

/// NVD timestamps carry milliseconds; the table only needs the day.
fn date_part(timestamp: &str) -> &str {
    timestamp.split('T').next().unwrap_or(timestamp)
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
