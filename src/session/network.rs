//! Outbound HTTP for authentication calls
//!
//! Strategies never talk to reqwest directly; they go through the
//! [`HttpTransport`] capability injected into the session manager. The
//! default implementation, [`NetworkManager`], applies the configured
//! timeouts and proxy and does not follow redirects, so login responses
//! keep their `Set-Cookie` headers.

use crate::{Result, config::Settings};
use reqwest::{Client, Proxy, redirect};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// HTTP method used by auth calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// Outbound auth request
#[derive(Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Target URL
    pub url: String,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Form-encoded body fields
    pub form: Option<Vec<(String, String)>>,
}

impl HttpRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: HashMap::new(),
            form: None,
        }
    }

    /// Create a form-encoded POST request
    pub fn post_form(url: impl Into<String>, form: Vec<(String, String)>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: HashMap::new(),
            form: Some(form),
        }
    }

    /// Add header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add several headers
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in headers {
            self.headers.insert(key.into(), value.into());
        }
        self
    }
}

// Header values and form fields carry secrets; only names are printed.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&String> = self.headers.keys().collect();
        let form_fields: Option<Vec<&String>> = self
            .form
            .as_ref()
            .map(|form| form.iter().map(|(name, _)| name).collect());
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &redact_url(&self.url))
            .field("headers", &header_names)
            .field("form", &form_fields)
            .finish()
    }
}

/// Response to an auth request
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, repeated names preserved in order
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: String,
}

impl HttpResponse {
    /// Create a response with status and body
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Status below 400
    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    /// All values of a header, case-insensitive
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// `name=value` pair of every `Set-Cookie` header
    pub fn cookie_pairs(&self) -> Vec<String> {
        self.header_values("set-cookie")
            .into_iter()
            .filter_map(|value| value.split(';').next())
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Capability for sending auth requests
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync + fmt::Debug {
    /// Send a request and return the response, whatever its status
    ///
    /// Connection failures and timeouts are errors; HTTP error statuses
    /// are not.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// URL without query string or fragment, safe to log
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            let _ = url.set_password(None);
            url.to_string()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}

/// Header value as text; bytes outside visible ASCII are decoded lossily
fn header_value_text(value: &reqwest::header::HeaderValue) -> String {
    match value.to_str() {
        Ok(text) => text.to_string(),
        Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
    }
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct NetworkManager {
    /// Base HTTP client
    client: Client,
    /// Request timeout, reported in timeout errors
    timeout: Duration,
}

impl NetworkManager {
    /// Create a network manager from settings
    pub fn new(settings: &Settings) -> Result<Self> {
        let timeout = settings.network.request_timeout();
        let mut client_builder = Client::builder()
            .user_agent(settings.network.user_agent.clone())
            .timeout(timeout)
            .connect_timeout(settings.network.connect_timeout())
            .redirect(redirect::Policy::none());

        if let Some(proxy_url) = settings.get_proxy_url() {
            let proxy = Proxy::all(&proxy_url).map_err(|e| {
                crate::Error::config("network.proxy", &format!("Invalid proxy URL: {}", e))
            })?;
            client_builder = client_builder.proxy(proxy);
        }

        let client = client_builder.build().map_err(|e| {
            crate::Error::config(
                "network",
                &format!("Failed to create HTTP client: {}", e),
            )
        })?;

        Ok(Self { client, timeout })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Get the configured HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn map_send_error(&self, request: &HttpRequest, error: reqwest::Error) -> crate::Error {
        let endpoint = redact_url(&request.url);
        if error.is_timeout() {
            crate::Error::timeout(
                format!("{} {}", request.method, endpoint),
                self.timeout.as_secs(),
            )
        } else {
            crate::Error::Network {
                message: error.without_url().to_string(),
                endpoint: Some(endpoint),
            }
        }
    }
}

#[async_trait::async_trait]
impl HttpTransport for NetworkManager {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(
            method = %request.method,
            url = %redact_url(&request.url),
            "Sending auth request"
        );

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }

        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.map_send_error(&request, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), header_value_text(value)))
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_send_error(&request, e))?;

        tracing::debug!(status, url = %redact_url(&request.url), "Auth request completed");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
