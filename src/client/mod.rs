//! The NVD API client.
//!
//! [`NvdApi`] exposes one async method per query shape. Each call validates
//! its input, builds the query string and issues exactly one GET against the
//! CVE or CPE-match endpoint.
//!
//! # Example
//!
//! ```no_run
//! use nvd_client::{AbsentOnFailure, NvdApi};
//!
//! # async fn run() -> Result<(), nvd_client::NvdError> {
//! let api = NvdApi::new(None, None)?;
//! if let Some(doc) = api.get_cve_by_id("CVE-2021-44228").await.absent_on_failure()? {
//!     println!("{}", doc["totalResults"]);
//! }
//! # Ok(())
//! # }
//! ```

mod observer;
mod transport;

pub use observer::{RequestObserver, SilentObserver, TracingObserver};
pub use transport::{ReqwestTransport, Transport, API_KEY_HEADER};

use crate::config::Config;
use crate::error::NvdError;
use crate::query::{self, DateFilters, Pagination, QueryParams};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_CVE_URL: &str = "https://services.nvd.nist.gov/rest/json/cves/2.0";
pub const DEFAULT_CPE_MATCH_URL: &str = "https://services.nvd.nist.gov/rest/json/cpematch/2.0";

/// The two NVD endpoints this client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Cves,
    CpeMatch,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Cves => "cves",
            Endpoint::CpeMatch => "cpematch",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client for the NVD CVE and CPE-match APIs.
///
/// Configuration is fixed at construction, so a client can be cloned and
/// shared between tasks freely.
#[derive(Clone)]
pub struct NvdApi {
    api_key: Option<String>,
    proxy: Option<String>,
    cve_url: String,
    cpe_match_url: String,
    transport: Arc<dyn Transport>,
    observer: Arc<dyn RequestObserver>,
}

impl NvdApi {
    /// Creates a client against the public NVD endpoints.
    ///
    /// Fails only if `proxy` cannot be used by the HTTP client.
    pub fn new(api_key: Option<String>, proxy: Option<String>) -> Result<Self, NvdError> {
        let transport = ReqwestTransport::from_proxy(proxy.as_deref())?;
        Ok(Self {
            api_key,
            proxy,
            cve_url: DEFAULT_CVE_URL.to_string(),
            cpe_match_url: DEFAULT_CPE_MATCH_URL.to_string(),
            transport: Arc::new(transport),
            observer: Arc::new(TracingObserver),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, NvdError> {
        Ok(Self::new(config.api_key.clone(), config.proxy.clone())?
            .with_base_urls(config.cve_url.clone(), config.cpe_match_url.clone()))
    }

    pub fn with_base_urls(
        mut self,
        cve_url: impl Into<String>,
        cpe_match_url: impl Into<String>,
    ) -> Self {
        self.cve_url = cve_url.into();
        self.cpe_match_url = cpe_match_url.into();
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Returns a copy of this client that routes requests through `proxy`
    /// instead of the client-level default.
    pub fn via_proxy(&self, proxy: &str) -> Result<Self, NvdError> {
        let transport = ReqwestTransport::with_proxy(proxy)?;
        Ok(Self {
            proxy: Some(proxy.to_string()),
            transport: Arc::new(transport),
            ..self.clone()
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    pub fn base_url(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Cves => &self.cve_url,
            Endpoint::CpeMatch => &self.cpe_match_url,
        }
    }

    /// Builds the full request URL for `params` against `endpoint`.
    pub fn request_url(&self, endpoint: Endpoint, params: &QueryParams) -> String {
        let base = self.base_url(endpoint);
        if params.is_empty() {
            base.to_string()
        } else {
            format!("{}?{}", base, params.to_query_string())
        }
    }

    /// Sends one GET for `params` and returns the JSON body.
    pub async fn dispatch(
        &self,
        endpoint: Endpoint,
        params: &QueryParams,
    ) -> Result<Value, NvdError> {
        let url = self.request_url(endpoint, params);
        self.observer.request_started(endpoint, &url);

        match self.transport.get_json(&url, self.api_key.as_deref()).await {
            Ok(doc) => {
                self.observer.request_succeeded(endpoint, &url);
                Ok(doc)
            }
            Err(e) => {
                self.observer.request_failed(endpoint, &e);
                Err(e)
            }
        }
    }

    /// Lists CVEs page by page.
    pub async fn get_all_cves(&self, page: Pagination) -> Result<Value, NvdError> {
        let params = query::all_cves(page)?;
        self.dispatch(Endpoint::Cves, &params).await
    }

    /// Fetches a single CVE. The identifier is checked before any request.
    pub async fn get_cve_by_id(&self, cve_id: &str) -> Result<Value, NvdError> {
        let params = query::cve_by_id(cve_id)?;
        self.dispatch(Endpoint::Cves, &params).await
    }

    /// Lists CVEs published and/or modified within the given windows.
    pub async fn get_cve_by_date(
        &self,
        page: Pagination,
        dates: &DateFilters,
    ) -> Result<Value, NvdError> {
        let params = query::cves_by_date(page, dates)?;
        self.dispatch(Endpoint::Cves, &params).await
    }

    /// Lists CVEs affecting `cpe_name`, optionally narrowed by date windows.
    pub async fn get_cve_by_cpe(
        &self,
        cpe_name: &str,
        page: Pagination,
        dates: &DateFilters,
    ) -> Result<Value, NvdError> {
        let params = query::cves_by_cpe(cpe_name, page, dates)?;
        self.dispatch(Endpoint::Cves, &params).await
    }

    /// Lists CPE match strings associated with a CVE.
    pub async fn get_cpes_by_cve(&self, cve_id: &str, page: Pagination) -> Result<Value, NvdError> {
        let params = query::cpe_matches_by_cve(cve_id, page)?;
        self.dispatch(Endpoint::CpeMatch, &params).await
    }

    /// Searches CPE match strings by free-text criteria.
    pub async fn get_cpes_by_criteria(
        &self,
        criteria: &str,
        page: Pagination,
    ) -> Result<Value, NvdError> {
        let params = query::cpe_matches_by_criteria(criteria, page)?;
        self.dispatch(Endpoint::CpeMatch, &params).await
    }

    /// Fetches CPE match strings by match criteria id.
    pub async fn get_cpes_by_criteria_id(
        &self,
        match_criteria_id: &str,
        page: Pagination,
    ) -> Result<Value, NvdError> {
        let params = query::cpe_matches_by_criteria_id(match_criteria_id, page)?;
        self.dispatch(Endpoint::CpeMatch, &params).await
    }
}

impl fmt::Debug for NvdApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NvdApi")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("proxy", &self.proxy)
            .field("cve_url", &self.cve_url)
            .field("cpe_match_url", &self.cpe_match_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every request and answers with a canned result.
    struct RecordingTransport {
        requests: Mutex<Vec<(String, Option<String>)>>,
        reply: Result<Value, NvdError>,
    }

    impl RecordingTransport {
        fn replying(reply: Result<Value, NvdError>) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                reply,
            })
        }

        fn requests(&self) -> Vec<(String, Option<String>)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn get_json(&self, url: &str, api_key: Option<&str>) -> Result<Value, NvdError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), api_key.map(str::to_string)));
            self.reply.clone()
        }
    }

    #[derive(Default)]
    struct CountingObserver {
        events: Mutex<Vec<String>>,
    }

    impl RequestObserver for CountingObserver {
        fn request_started(&self, endpoint: Endpoint, _url: &str) {
            self.events.lock().unwrap().push(format!("start:{}", endpoint));
        }

        fn request_succeeded(&self, endpoint: Endpoint, _url: &str) {
            self.events.lock().unwrap().push(format!("ok:{}", endpoint));
        }

        fn request_failed(&self, endpoint: Endpoint, error: &NvdError) {
            self.events
                .lock()
                .unwrap()
                .push(format!("fail:{}:{}", endpoint, error.category()));
        }
    }

    fn api_with(transport: Arc<RecordingTransport>, api_key: Option<&str>) -> NvdApi {
        NvdApi::new(api_key.map(str::to_string), None)
            .unwrap()
            .with_observer(Arc::new(SilentObserver))
            .with_transport(transport)
    }

    #[tokio::test]
    async fn test_get_cve_by_id_builds_url() {
        let transport = RecordingTransport::replying(Ok(json!({"totalResults": 1})));
        let api = api_with(transport.clone(), None);

        let doc = api.get_cve_by_id("CVE-2021-44228").await.unwrap();
        assert_eq!(doc["totalResults"], 1);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].0,
            "https://services.nvd.nist.gov/rest/json/cves/2.0?cveId=CVE-2021-44228"
        );
        assert_eq!(requests[0].1, None);
    }

    #[tokio::test]
    async fn test_invalid_cve_id_never_dispatches() {
        let transport = RecordingTransport::replying(Ok(json!({})));
        let api = api_with(transport.clone(), None);

        let err = api.get_cve_by_id("not-a-cve").await.unwrap_err();
        assert_eq!(
            err,
            NvdError::InvalidCveId {
                cve_id: "not-a-cve".to_string()
            }
        );

        let err = api
            .get_cpes_by_cve("CVE-2021-1", Pagination::cpe_matches())
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_half_date_window_never_dispatches() {
        let transport = RecordingTransport::replying(Ok(json!({})));
        let api = api_with(transport.clone(), None);

        let dates = DateFilters {
            publish_start_date: Some("2024-01-01".into()),
            publish_end_date: None,
            ..Default::default()
        };
        let err = api
            .get_cve_by_date(Pagination::default(), &dates)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            NvdError::InvalidParameters {
                params: vec![
                    "publish_start_date".to_string(),
                    "publish_end_date".to_string()
                ]
            }
        );
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_api_key_is_forwarded() {
        let transport = RecordingTransport::replying(Ok(json!({})));
        let api = api_with(transport.clone(), Some("secret-key"));

        api.get_all_cves(Pagination::new(10, 0)).await.unwrap();
        let requests = transport.requests();
        assert_eq!(requests[0].1.as_deref(), Some("secret-key"));
        assert!(requests[0].0.ends_with("?resultsPerPage=10&startIndex=0"));
    }

    #[tokio::test]
    async fn test_cpe_match_calls_use_cpe_match_endpoint() {
        let transport = RecordingTransport::replying(Ok(json!({})));
        let api = api_with(transport.clone(), None)
            .with_base_urls("http://mirror.test/cves", "http://mirror.test/cpematch");

        let page = Pagination::cpe_matches();
        api.get_cpes_by_cve("CVE-2022-22965", page).await.unwrap();
        api.get_cpes_by_criteria("log4j", page).await.unwrap();
        api.get_cpes_by_criteria_id("ABC-123", page).await.unwrap();
        api.get_cve_by_cpe("cpe:2.3:a:x:y", Pagination::new(1, 0), &DateFilters::default())
            .await
            .unwrap();

        let urls: Vec<String> = transport.requests().into_iter().map(|(u, _)| u).collect();
        assert_eq!(
            urls,
            vec![
                "http://mirror.test/cpematch?resultsPerPage=500&startIndex=0&cveId=CVE-2022-22965",
                "http://mirror.test/cpematch?resultsPerPage=500&startIndex=0&matchStringSearch=log4j",
                "http://mirror.test/cpematch?resultsPerPage=500&startIndex=0&matchCriteriaId=ABC-123",
                "http://mirror.test/cves?resultsPerPage=1&startIndex=0&cpeName=cpe%3A2.3%3Aa%3Ax%3Ay",
            ]
        );
    }

    #[tokio::test]
    async fn test_observer_sees_success_and_failure() {
        let observer = Arc::new(CountingObserver::default());

        let ok = api_with(RecordingTransport::replying(Ok(json!({}))), None)
            .with_observer(observer.clone());
        ok.get_all_cves(Pagination::default()).await.unwrap();

        let failing = api_with(
            RecordingTransport::replying(Err(NvdError::HttpStatus {
                url: "u".to_string(),
                status: 503,
            })),
            None,
        )
        .with_observer(observer.clone());
        let err = failing
            .get_cpes_by_criteria("x", Pagination::cpe_matches())
            .await
            .unwrap_err();
        assert!(err.is_request_failure());

        // Validation failures are not requests, so the observer hears nothing.
        let _ = failing.get_cve_by_id("nope").await;

        assert_eq!(
            *observer.events.lock().unwrap(),
            vec![
                "start:cves".to_string(),
                "ok:cves".to_string(),
                "start:cpematch".to_string(),
                "fail:cpematch:http".to_string(),
            ]
        );
    }

    #[test]
    fn test_request_url_without_params() {
        let api = NvdApi::new(None, None).unwrap();
        assert_eq!(
            api.request_url(Endpoint::CpeMatch, &QueryParams::new()),
            DEFAULT_CPE_MATCH_URL
        );
    }

    #[test]
    fn test_via_proxy_overrides_default() {
        let api = NvdApi::new(None, Some("http://127.0.0.1:3128".to_string())).unwrap();
        assert_eq!(api.proxy(), Some("http://127.0.0.1:3128"));

        let per_call = api.via_proxy("socks5://127.0.0.1:9050").unwrap();
        assert_eq!(per_call.proxy(), Some("socks5://127.0.0.1:9050"));
        assert_eq!(api.proxy(), Some("http://127.0.0.1:3128"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let api = NvdApi::new(Some("super-secret".to_string()), None).unwrap();
        let debug = format!("{:?}", api);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
        assert!(api.has_api_key());
    }

    #[test]
    fn test_from_config_uses_base_urls() {
        let config = Config {
            api_key: Some("k".to_string()),
            cve_url: "http://localhost:1/cves".to_string(),
            cpe_match_url: "http://localhost:1/cpematch".to_string(),
            ..Config::default()
        };
        let api = NvdApi::from_config(&config).unwrap();
        assert_eq!(api.base_url(Endpoint::Cves), "http://localhost:1/cves");
        assert_eq!(api.base_url(Endpoint::CpeMatch), "http://localhost:1/cpematch");
        assert!(api.has_api_key());
    }
}
