use super::Endpoint;
use crate::error::NvdError;
use tracing::{error, info};

/// Hook for reporting request activity.
///
/// The client never touches global logging configuration; it reports to the
/// observer it was built with. All methods default to doing nothing.
pub trait RequestObserver: Send + Sync {
    fn request_started(&self, _endpoint: Endpoint, _url: &str) {}

    fn request_succeeded(&self, _endpoint: Endpoint, _url: &str) {}

    fn request_failed(&self, _endpoint: Endpoint, _error: &NvdError) {}
}

/// Emits `tracing` events: attempts at info, failures at error.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn request_started(&self, endpoint: Endpoint, url: &str) {
        info!(endpoint = endpoint.as_str(), url, "Requesting NVD");
    }

    fn request_succeeded(&self, endpoint: Endpoint, url: &str) {
        info!(endpoint = endpoint.as_str(), url, "NVD request succeeded");
    }

    fn request_failed(&self, endpoint: Endpoint, err: &NvdError) {
        let endpoint = endpoint.as_str();
        match err {
            NvdError::Timeout { url } => {
                error!(endpoint, url = url.as_str(), "NVD request timed out")
            }
            NvdError::Connection { url, message } => {
                error!(endpoint, url = url.as_str(), "Connection error: {}", message)
            }
            NvdError::HttpStatus { url, status } => {
                error!(endpoint, url = url.as_str(), status, "HTTP error from NVD")
            }
            NvdError::Proxy { proxy, message } => {
                error!(endpoint, proxy = proxy.as_str(), "Proxy error: {}", message)
            }
            other => error!(endpoint, category = other.category(), "Request failed: {}", other),
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl RequestObserver for SilentObserver {}
