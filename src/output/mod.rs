mod cli;
mod json;

pub use cli::{print_table, render_table};
pub use json::print_json;

use crate::client::Endpoint;
use anyhow::Result;
use serde_json::Value;

/// Output format for query results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table of the main fields
    Table,
    /// The response document, pretty-printed
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use 'table' or 'json'", s)),
        }
    }
}

pub fn print_result(doc: &Value, endpoint: Endpoint, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_table(doc, endpoint),
        OutputFormat::Json => print_json(doc),
    }
}

/// Format result to string for file output
pub fn format_result_to_string(
    doc: &Value,
    endpoint: Endpoint,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(doc)?),
        OutputFormat::Table => Ok(render_table(doc, endpoint)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("table".parse::<OutputFormat>(), Ok(OutputFormat::Table));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("sarif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_json_output_is_verbatim() {
        let doc = json!({"totalResults": 0, "vulnerabilities": []});
        let text = format_result_to_string(&doc, Endpoint::Cves, OutputFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, doc);
    }
}
