//! Generic JSON request wrapper.
//!
//! # Responsibilities
//! - Build one HTTP client per session, routed through its egress proxy
//! - Attach browser-like headers and the auth token
//! - Treat HTTP 400 as a parseable body and 401 as an auth failure
//!
//! # Design Decisions
//! - One request per call; retries belong to the orchestrator
//! - The user agent is chosen once per session and kept for its lifetime

use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::resilience::delay::trim_diagnostic;
use crate::service::types::{ApiResponse, ServiceError, ServiceResult};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/125.0.6422.80 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 EdgiOS/125.2535.60 Mobile/15E148 Safari/605.1.15",
    "Mozilla/5.0 (Linux; Android 10; SM-G973F) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.6422.113 Mobile Safari/537.36 EdgA/124.0.2478.104",
    "Mozilla/5.0 (Linux; Android 10; Pixel 3 XL) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.6422.113 Mobile Safari/537.36 EdgA/124.0.2478.104",
    "Mozilla/5.0 (Linux; Android 10; VOG-L29) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.6422.113 Mobile Safari/537.36 OPR/76.2.4027.73374",
    "Mozilla/5.0 (Linux; Android 10; SM-N975F) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.6422.113 Mobile Safari/537.36 OPR/76.2.4027.73374",
];

/// Pick a user agent for a new session.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// HTTP client bound to one base URL and, optionally, one egress route.
#[derive(Clone)]
pub struct RequestWrapper {
    http: reqwest::Client,
    base_url: String,
    route: Option<String>,
}

impl RequestWrapper {
    /// Build a client. Fails if the route is not a valid proxy URL.
    pub fn new(base_url: &str, route: Option<&str>, timeout: Duration) -> ServiceResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB,en-US;q=0.9,en;q=0.8"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .user_agent(random_user_agent())
            .default_headers(headers)
            .timeout(timeout);

        if let Some(route) = route {
            let proxy = reqwest::Proxy::all(route)
                .map_err(|e| ServiceError::Transport(format!("invalid proxy '{}': {}", route, e)))?;
            builder = builder.proxy(proxy);
        }

        let http = builder
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            route: route.map(str::to_string),
        })
    }

    /// Whether requests leave through a proxy.
    pub fn is_routed(&self) -> bool {
        self.route.is_some()
    }

    /// Perform one request and decode the response envelope.
    pub async fn call<T, B>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> ServiceResult<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);

        if let Some(token) = token {
            request = request.header(AUTHORIZATION, token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(method = %method, url = %url, routed = self.is_routed(), "Service request");

        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        let status = response.status();

        tracing::debug!(method = %method, url = %url, status = status.as_u16(), "Service response");

        if status == StatusCode::UNAUTHORIZED {
            return Err(ServiceError::Unauthorized);
        }

        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        if !(status.is_success() || status == StatusCode::BAD_REQUEST) {
            return Err(ServiceError::Http {
                status: status.as_u16(),
                body: trim_diagnostic(&text),
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| ServiceError::Decode(format!("{} ({})", e, trim_diagnostic(&text))))
    }
}

impl std::fmt::Debug for RequestWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestWrapper")
            .field("base_url", &self.base_url)
            .field("routed", &self.route.is_some())
            .finish()
    }
}
