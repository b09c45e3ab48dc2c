//! Row views over NVD response documents.
//!
//! The client returns responses as opaque [`serde_json::Value`] trees. This
//! module pulls out the handful of fields the command-line output shows:
//!
//! - [`CveSummary`] - one entry of a CVE search (`vulnerabilities[].cve`)
//! - [`MatchSummary`] - one entry of a CPE-match search (`matchStrings[].matchString`)
//! - [`PageInfo`] - paging counters shared by both endpoints
//!
//! Extraction is best effort: missing or oddly typed fields become `None`
//! rather than errors.
//!
//! # Example
//!
//! ```
//! use nvd_client::model::{cve_summaries, PageInfo};
//! use serde_json::json;
//!
//! let doc = json!({
//!     "resultsPerPage": 1, "startIndex": 0, "totalResults": 1,
//!     "vulnerabilities": [{"cve": {"id": "CVE-2021-44228", "vulnStatus": "Analyzed"}}]
//! });
//!
//! let rows = cve_summaries(&doc);
//! assert_eq!(rows[0].id, "CVE-2021-44228");
//! assert_eq!(PageInfo::from_document(&doc).total_results, Some(1));
//! ```

mod summary;

pub use summary::*;
