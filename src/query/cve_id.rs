use crate::error::NvdError;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static CVE_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CVE-\d{4}-\d{4,}$").expect("CVE ID pattern is valid"));

/// Returns true if `cve_id` has the `CVE-YYYY-NNNN` shape (four or more
/// sequence digits).
pub fn is_valid_cve_id(cve_id: &str) -> bool {
    CVE_ID_PATTERN.is_match(cve_id)
}

/// Checks a CVE identifier, failing with [`NvdError::InvalidCveId`] on mismatch.
///
/// ```
/// use nvd_client::query::validate_cve_id;
///
/// assert!(validate_cve_id("CVE-2021-44228").is_ok());
/// assert!(validate_cve_id("cve-2021-44228").is_err());
/// ```
pub fn validate_cve_id(cve_id: &str) -> Result<(), NvdError> {
    if is_valid_cve_id(cve_id) {
        Ok(())
    } else {
        Err(NvdError::InvalidCveId {
            cve_id: cve_id.to_string(),
        })
    }
}

/// A CVE identifier that has passed [`validate_cve_id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CveId(String);

impl CveId {
    pub fn parse(cve_id: &str) -> Result<Self, NvdError> {
        validate_cve_id(cve_id)?;
        Ok(Self(cve_id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn year(&self) -> u16 {
        // Shape is guaranteed by the pattern: "CVE-" followed by four digits.
        self.0[4..8].parse().unwrap_or_default()
    }
}

impl FromStr for CveId {
    type Err = NvdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CveId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
