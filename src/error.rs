//! Error types for NVD queries.
//!
//! Every facade call returns `Result<serde_json::Value, NvdError>`. Errors fall
//! into two groups:
//!
//! - **Validation** errors are raised before any network I/O: malformed dates,
//!   half-specified date windows, malformed CVE identifiers and oversized pages.
//! - **Request** errors describe what went wrong while talking to the remote
//!   service: timeouts, connection failures, non-2xx statuses, bodies that are
//!   not JSON, and unusable proxy settings.
//!
//! Callers that only care about "data or no data" can collapse request errors
//! with [`AbsentOnFailure`]:
//!
//! ```
//! use nvd_client::{AbsentOnFailure, NvdError};
//! use serde_json::Value;
//!
//! let failed: Result<Value, NvdError> = Err(NvdError::HttpStatus {
//!     url: "https://services.nvd.nist.gov/rest/json/cves/2.0".to_string(),
//!     status: 503,
//! });
//! assert_eq!(failed.absent_on_failure().unwrap(), None);
//! ```

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NvdError {
    #[error("invalid date format: {value} (expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS.mmm)")]
    InvalidDateFormat { value: String },

    #[error(
        "missing or incomplete parameters: {} (both parameters are required)",
        .params.join(", ")
    )]
    InvalidParameters { params: Vec<String> },

    #[error("invalid CVE ID: {cve_id} (expected CVE-YYYY-NNNN)")]
    InvalidCveId { cve_id: String },

    #[error("results per page {requested} exceeds the endpoint maximum of {max}")]
    PageSizeTooLarge { requested: u32, max: u32 },

    #[error("unusable proxy {proxy}: {message}")]
    Proxy { proxy: String, message: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    #[error("HTTP error {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("invalid JSON from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
}

impl NvdError {
    /// True for errors raised before any request was attempted because the
    /// caller's input was malformed.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            NvdError::InvalidDateFormat { .. }
                | NvdError::InvalidParameters { .. }
                | NvdError::InvalidCveId { .. }
                | NvdError::PageSizeTooLarge { .. }
        )
    }

    /// True for everything that [`AbsentOnFailure`] collapses into "no data".
    pub fn is_request_failure(&self) -> bool {
        !self.is_validation()
    }

    /// Short category name used in log lines.
    pub fn category(&self) -> &'static str {
        match self {
            NvdError::InvalidDateFormat { .. } => "invalid-date-format",
            NvdError::InvalidParameters { .. } => "invalid-parameters",
            NvdError::InvalidCveId { .. } => "invalid-cve-id",
            NvdError::PageSizeTooLarge { .. } => "page-size",
            NvdError::Proxy { .. } => "proxy",
            NvdError::Timeout { .. } => "timeout",
            NvdError::Connection { .. } => "connection",
            NvdError::HttpStatus { .. } => "http",
            NvdError::InvalidResponse { .. } => "decode",
            NvdError::Request { .. } => "request",
        }
    }
}

/// Collapses request failures into `Ok(None)` while keeping validation
/// failures as errors.
pub trait AbsentOnFailure {
    fn absent_on_failure(self) -> Result<Option<Value>, NvdError>;
}

impl AbsentOnFailure for Result<Value, NvdError> {
    fn absent_on_failure(self) -> Result<Option<Value>, NvdError> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_request_failure() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
