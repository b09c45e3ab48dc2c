use crate::error::NvdError;
use async_trait::async_trait;
use serde_json::Value;

/// Header carrying the NVD API key.
pub const API_KEY_HEADER: &str = "apiKey";

/// Issues a single GET and returns the decoded JSON body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, url: &str, api_key: Option<&str>) -> Result<Value, NvdError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// A direct transport. Proxy environment variables are ignored so that
    /// traffic only goes through a proxy the caller configured.
    pub fn new() -> Result<Self, NvdError> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| NvdError::Request {
                url: String::new(),
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    /// Routes both http and https traffic through `proxy`
    /// (`http://`, `https://` or `socks5://`).
    pub fn with_proxy(proxy: &str) -> Result<Self, NvdError> {
        let proxy_error = |e: reqwest::Error| NvdError::Proxy {
            proxy: proxy.to_string(),
            message: e.to_string(),
        };
        let client = reqwest::Client::builder()
            .proxy(reqwest::Proxy::all(proxy).map_err(proxy_error)?)
            .build()
            .map_err(proxy_error)?;
        Ok(Self { client })
    }

    pub fn from_proxy(proxy: Option<&str>) -> Result<Self, NvdError> {
        match proxy {
            Some(proxy) => Self::with_proxy(proxy),
            None => Self::new(),
        }
    }
}

fn classify(url: &str, e: reqwest::Error) -> NvdError {
    if e.is_timeout() {
        NvdError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        NvdError::Connection {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else if e.is_decode() {
        NvdError::InvalidResponse {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        NvdError::Request {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get_json(&self, url: &str, api_key: Option<&str>) -> Result<Value, NvdError> {
        let mut request = self.client.get(url);
        if let Some(key) = api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NvdError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Read the body first so a truncated transfer and a non-JSON body
        // land in different categories.
        let body = response.bytes().await.map_err(|e| classify(url, e))?;
        serde_json::from_slice(&body).map_err(|e| NvdError::InvalidResponse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
