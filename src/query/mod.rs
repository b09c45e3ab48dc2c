//! Query construction for the NVD CVE and CPE-match endpoints.
//!
//! This module turns caller input into an ordered list of query parameters:
//!
//! - [`validate_cve_id`] and [`CveId`] check identifiers
//! - [`DateFilters`] and [`resolve_date_range`] handle publish/modify windows
//! - [`QueryParams`] keeps parameters in insertion order and renders the
//!   percent-encoded query string
//!
//! # Example
//!
//! ```
//! use nvd_client::query::{self, Pagination};
//!
//! let params = query::cve_by_id("CVE-2021-44228").unwrap();
//! assert_eq!(params.to_query_string(), "cveId=CVE-2021-44228");
//!
//! let params = query::all_cves(Pagination::new(20, 40)).unwrap();
//! assert_eq!(params.to_query_string(), "resultsPerPage=20&startIndex=40");
//! ```

mod cve_id;
mod date;

pub use cve_id::{is_valid_cve_id, validate_cve_id, CveId};
pub use date::{
    convert_date_to_iso, resolve_date_range, validate_date_format, DateFilters, DateInput,
    ResolvedDates,
};

use crate::error::NvdError;
use std::fmt;

/// Largest page the CVE endpoint serves.
pub const MAX_CVE_RESULTS_PER_PAGE: u32 = 2000;

/// Largest page the CPE-match endpoint serves.
pub const MAX_CPE_MATCH_RESULTS_PER_PAGE: u32 = 500;

/// Query parameter names understood by the NVD API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    ResultsPerPage,
    StartIndex,
    CveId,
    CpeName,
    PubStartDate,
    PubEndDate,
    LastModStartDate,
    LastModEndDate,
    MatchStringSearch,
    MatchCriteriaId,
}

impl Param {
    pub fn as_str(&self) -> &'static str {
        match self {
            Param::ResultsPerPage => "resultsPerPage",
            Param::StartIndex => "startIndex",
            Param::CveId => "cveId",
            Param::CpeName => "cpeName",
            Param::PubStartDate => "pubStartDate",
            Param::PubEndDate => "pubEndDate",
            Param::LastModStartDate => "lastModStartDate",
            Param::LastModEndDate => "lastModEndDate",
            Param::MatchStringSearch => "matchStringSearch",
            Param::MatchCriteriaId => "matchCriteriaId",
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Number(u32),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Number(value)
    }
}

/// Ordered query parameters for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(Param, ParamValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter. A repeated name replaces the earlier value in
    /// place so the first insertion position is kept.
    pub fn push(&mut self, param: Param, value: impl Into<ParamValue>) -> &mut Self {
        let value = value.into();
        if let Some(slot) = self.pairs.iter_mut().find(|(p, _)| *p == param) {
            slot.1 = value;
        } else {
            self.pairs.push((param, value));
        }
        self
    }

    pub fn get(&self, param: Param) -> Option<&ParamValue> {
        self.pairs.iter().find(|(p, _)| *p == param).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Param, &ParamValue)> {
        self.pairs.iter().map(|(p, v)| (*p, v))
    }

    fn push_page(&mut self, page: Pagination) -> &mut Self {
        self.push(Param::ResultsPerPage, page.results_per_page)
            .push(Param::StartIndex, page.start_index)
    }

    fn push_dates(&mut self, dates: &ResolvedDates) -> &mut Self {
        if let Some((start, end)) = &dates.published {
            self.push(Param::PubStartDate, start.as_str())
                .push(Param::PubEndDate, end.as_str());
        }
        if let Some((start, end)) = &dates.modified {
            self.push(Param::LastModStartDate, start.as_str())
                .push(Param::LastModEndDate, end.as_str());
        }
        self
    }

    /// Renders `key=value` pairs joined by `&`, in insertion order, with
    /// values percent-encoded.
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (param, value) in &self.pairs {
            serializer.append_pair(param.as_str(), &value.to_string());
        }
        serializer.finish()
    }
}

/// Page size and offset for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub results_per_page: u32,
    pub start_index: u32,
}

impl Pagination {
    pub fn new(results_per_page: u32, start_index: u32) -> Self {
        Self {
            results_per_page,
            start_index,
        }
    }

    /// Default paging for the CVE endpoint (2000 per page from index 0).
    pub fn cves() -> Self {
        Self::new(MAX_CVE_RESULTS_PER_PAGE, 0)
    }

    /// Default paging for the CPE-match endpoint (500 per page from index 0).
    pub fn cpe_matches() -> Self {
        Self::new(MAX_CPE_MATCH_RESULTS_PER_PAGE, 0)
    }

    pub fn with_offset(mut self, start_index: u32) -> Self {
        self.start_index = start_index;
        self
    }

    fn check_max(&self, max: u32) -> Result<(), NvdError> {
        if self.results_per_page > max {
            return Err(NvdError::PageSizeTooLarge {
                requested: self.results_per_page,
                max,
            });
        }
        Ok(())
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::cves()
    }
}

pub fn all_cves(page: Pagination) -> Result<QueryParams, NvdError> {
    page.check_max(MAX_CVE_RESULTS_PER_PAGE)?;
    let mut params = QueryParams::new();
    params.push_page(page);
    Ok(params)
}

pub fn cve_by_id(cve_id: &str) -> Result<QueryParams, NvdError> {
    validate_cve_id(cve_id)?;
    let mut params = QueryParams::new();
    params.push(Param::CveId, cve_id);
    Ok(params)
}

pub fn cves_by_date(page: Pagination, dates: &DateFilters) -> Result<QueryParams, NvdError> {
    let resolved = dates.resolve()?;
    page.check_max(MAX_CVE_RESULTS_PER_PAGE)?;
    let mut params = QueryParams::new();
    params.push_dates(&resolved).push_page(page);
    Ok(params)
}

pub fn cves_by_cpe(
    cpe_name: &str,
    page: Pagination,
    dates: &DateFilters,
) -> Result<QueryParams, NvdError> {
    let resolved = dates.resolve()?;
    page.check_max(MAX_CVE_RESULTS_PER_PAGE)?;
    let mut params = QueryParams::new();
    params
        .push_dates(&resolved)
        .push_page(page)
        .push(Param::CpeName, cpe_name);
    Ok(params)
}

pub fn cpe_matches_by_cve(cve_id: &str, page: Pagination) -> Result<QueryParams, NvdError> {
    validate_cve_id(cve_id)?;
    page.check_max(MAX_CPE_MATCH_RESULTS_PER_PAGE)?;
    let mut params = QueryParams::new();
    params.push_page(page).push(Param::CveId, cve_id);
    Ok(params)
}

pub fn cpe_matches_by_criteria(criteria: &str, page: Pagination) -> Result<QueryParams, NvdError> {
    page.check_max(MAX_CPE_MATCH_RESULTS_PER_PAGE)?;
    let mut params = QueryParams::new();
    params
        .push_page(page)
        .push(Param::MatchStringSearch, criteria);
    Ok(params)
}

pub fn cpe_matches_by_criteria_id(
    match_criteria_id: &str,
    page: Pagination,
) -> Result<QueryParams, NvdError> {
    page.check_max(MAX_CPE_MATCH_RESULTS_PER_PAGE)?;
    let mut params = QueryParams::new();
    params
        .push_page(page)
        .push(Param::MatchCriteriaId, match_criteria_id);
    Ok(params)
}
