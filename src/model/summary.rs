use serde::Serialize;
use serde_json::Value;

/// Metric blocks in order of preference.
const CVSS_METRIC_KEYS: [&str; 4] = [
    "cvssMetricV40",
    "cvssMetricV31",
    "cvssMetricV30",
    "cvssMetricV2",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    None,
    Unknown,
}

impl Severity {
    /// Maps a CVSS base score onto the qualitative scale.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 9.0 => Severity::Critical,
            s if s >= 7.0 => Severity::High,
            s if s >= 4.0 => Severity::Medium,
            s if s > 0.0 => Severity::Low,
            s if s == 0.0 => Severity::None,
            _ => Severity::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::None => "NONE",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CveSummary {
    pub id: String,
    pub published: Option<String>,
    pub last_modified: Option<String>,
    pub status: Option<String>,
    pub base_score: Option<f64>,
    pub severity: Severity,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub criteria: String,
    pub match_criteria_id: Option<String>,
    pub status: Option<String>,
    pub last_modified: Option<String>,
    pub cpe_count: usize,
}

/// Paging counters present on both endpoints' responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub results_per_page: Option<u64>,
    pub start_index: Option<u64>,
    pub total_results: Option<u64>,
}

impl PageInfo {
    pub fn from_document(doc: &Value) -> Self {
        Self {
            results_per_page: doc.get("resultsPerPage").and_then(Value::as_u64),
            start_index: doc.get("startIndex").and_then(Value::as_u64),
            total_results: doc.get("totalResults").and_then(Value::as_u64),
        }
    }
}

fn text(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

pub fn cve_summaries(doc: &Value) -> Vec<CveSummary> {
    doc.get("vulnerabilities")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("cve"))
                .filter_map(cve_summary)
                .collect()
        })
        .unwrap_or_default()
}

fn cve_summary(cve: &Value) -> Option<CveSummary> {
    let id = text(cve, "id")?;
    let base_score = base_score(cve);
    let severity = base_severity(cve)
        .or_else(|| base_score.map(Severity::from_score))
        .unwrap_or(Severity::Unknown);

    Some(CveSummary {
        id,
        published: text(cve, "published"),
        last_modified: text(cve, "lastModified"),
        status: text(cve, "vulnStatus"),
        base_score,
        severity,
        description: english_description(cve),
    })
}

fn first_metric(cve: &Value) -> Option<&Value> {
    let metrics = cve.get("metrics")?;
    CVSS_METRIC_KEYS.iter().find_map(|key| {
        metrics
            .get(*key)
            .and_then(Value::as_array)
            .and_then(|entries| entries.first())
    })
}

fn base_score(cve: &Value) -> Option<f64> {
    first_metric(cve)?
        .get("cvssData")?
        .get("baseScore")?
        .as_f64()
}

fn base_severity(cve: &Value) -> Option<Severity> {
    let metric = first_metric(cve)?;
    // CVSS v2 keeps the severity next to cvssData, later versions inside it.
    let label = metric
        .get("cvssData")
        .and_then(|data| data.get("baseSeverity"))
        .or_else(|| metric.get("baseSeverity"))?
        .as_str()?;

    match label.to_ascii_uppercase().as_str() {
        "CRITICAL" => Some(Severity::Critical),
        "HIGH" => Some(Severity::High),
        "MEDIUM" => Some(Severity::Medium),
        "LOW" => Some(Severity::Low),
        "NONE" => Some(Severity::None),
        _ => None,
    }
}

fn english_description(cve: &Value) -> Option<String> {
    let descriptions = cve.get("descriptions")?.as_array()?;
    descriptions
        .iter()
        .find(|d| d.get("lang").and_then(Value::as_str) == Some("en"))
        .or_else(|| descriptions.first())
        .and_then(|d| text(d, "value"))
}

pub fn match_summaries(doc: &Value) -> Vec<MatchSummary> {
    doc.get("matchStrings")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("matchString"))
                .filter_map(|m| {
                    Some(MatchSummary {
                        criteria: text(m, "criteria")?,
                        match_criteria_id: text(m, "matchCriteriaId"),
                        status: text(m, "status"),
                        last_modified: text(m, "lastModified"),
                        cpe_count: m
                            .get("matches")
                            .and_then(Value::as_array)
                            .map(Vec::len)
                            .unwrap_or(0),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn log4shell() -> Value {
        json!({
            "resultsPerPage": 1,
            "startIndex": 0,
            "totalResults": 1,
            "format": "NVD_CVE",
            "version": "2.0",
            "vulnerabilities": [{
                "cve": {
                    "id": "CVE-2021-44228",
                    "sourceIdentifier": "security@apache.org",
                    "published": "2021-12-10T10:15:09.143",
                    "lastModified": "2024-07-24T17:08:24.167",
                    "vulnStatus": "Analyzed",
                    "descriptions": [
                        {"lang": "es", "value": "Apache Log4j2 ..."},
                        {"lang": "en", "value": "Apache Log4j2 JNDI features do not protect against attacker controlled LDAP."}
                    ],
                    "metrics": {
                        "cvssMetricV31": [{
                            "source": "nvd@nist.gov",
                            "type": "Primary",
                            "cvssData": {"version": "3.1", "baseScore": 10.0, "baseSeverity": "CRITICAL"}
                        }],
                        "cvssMetricV2": [{
                            "source": "nvd@nist.gov",
                            "type": "Primary",
                            "cvssData": {"version": "2.0", "baseScore": 9.3},
                            "baseSeverity": "HIGH"
                        }]
                    }
                }
            }]
        })
    }

    #[test]
    fn test_cve_summary_fields() {
        let rows = cve_summaries(&log4shell());
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.id, "CVE-2021-44228");
        assert_eq!(row.published.as_deref(), Some("2021-12-10T10:15:09.143"));
        assert_eq!(row.status.as_deref(), Some("Analyzed"));
        assert_eq!(row.base_score, Some(10.0));
        assert_eq!(row.severity, Severity::Critical);
        assert!(row.description.as_deref().unwrap().starts_with("Apache Log4j2 JNDI"));
    }

    #[test]
    fn test_cvss_v2_severity_sits_beside_data() {
        let doc = json!({
            "vulnerabilities": [{"cve": {
                "id": "CVE-2005-0001",
                "metrics": {"cvssMetricV2": [{"cvssData": {"baseScore": 4.6}, "baseSeverity": "MEDIUM"}]}
            }}]
        });
        let row = &cve_summaries(&doc)[0];
        assert_eq!(row.base_score, Some(4.6));
        assert_eq!(row.severity, Severity::Medium);
    }

    #[test]
    fn test_severity_falls_back_to_score() {
        let doc = json!({
            "vulnerabilities": [{"cve": {
                "id": "CVE-2024-0001",
                "metrics": {"cvssMetricV30": [{"cvssData": {"baseScore": 7.5}}]}
            }}]
        });
        assert_eq!(cve_summaries(&doc)[0].severity, Severity::High);
    }

    #[test]
    fn test_missing_metrics_is_unknown() {
        let doc = json!({"vulnerabilities": [{"cve": {"id": "CVE-2024-9999", "vulnStatus": "Received"}}]});
        let row = &cve_summaries(&doc)[0];
        assert_eq!(row.base_score, None);
        assert_eq!(row.severity, Severity::Unknown);
        assert_eq!(row.description, None);
    }

    #[test]
    fn test_entries_without_id_are_skipped() {
        let doc = json!({"vulnerabilities": [{"cve": {}}, {"nope": 1}, {"cve": {"id": "CVE-2020-0001"}}]});
        let ids: Vec<String> = cve_summaries(&doc).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["CVE-2020-0001"]);
    }

    #[test]
    fn test_non_object_documents() {
        assert!(cve_summaries(&json!([1, 2, 3])).is_empty());
        assert!(match_summaries(&json!("text")).is_empty());
        assert_eq!(PageInfo::from_document(&json!(null)), PageInfo::default());
    }

    #[test]
    fn test_match_summaries() {
        let doc = json!({
            "resultsPerPage": 1,
            "startIndex": 0,
            "totalResults": 1,
            "matchStrings": [{
                "matchString": {
                    "matchCriteriaId": "36FBCF0F-8CEE-474C-8A04-5075AF53FAF4",
                    "criteria": "cpe:2.3:a:apache:log4j:*:*:*:*:*:*:*:*",
                    "lastModified": "2022-01-01T00:00:00.000",
                    "status": "Active",
                    "matches": [
                        {"cpeName": "cpe:2.3:a:apache:log4j:2.0:-:*:*:*:*:*:*"},
                        {"cpeName": "cpe:2.3:a:apache:log4j:2.1:*:*:*:*:*:*:*"}
                    ]
                }
            }]
        });

        let rows = match_summaries(&doc);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].criteria, "cpe:2.3:a:apache:log4j:*:*:*:*:*:*:*:*");
        assert_eq!(rows[0].status.as_deref(), Some("Active"));
        assert_eq!(rows[0].cpe_count, 2);

        let page = PageInfo::from_document(&doc);
        assert_eq!(page.total_results, Some(1));
        assert_eq!(page.results_per_page, Some(1));
    }

    #[test]
    fn test_severity_from_score() {
        assert_eq!(Severity::from_score(9.8), Severity::Critical);
        assert_eq!(Severity::from_score(7.0), Severity::High);
        assert_eq!(Severity::from_score(6.9), Severity::Medium);
        assert_eq!(Severity::from_score(0.1), Severity::Low);
        assert_eq!(Severity::from_score(0.0), Severity::None);
        assert_eq!(Severity::from_score(-1.0), Severity::Unknown);
    }
}
