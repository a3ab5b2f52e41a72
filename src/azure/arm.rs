//! Thin Azure Resource Manager REST client.
//!
//! Wraps `reqwest` with bearer auth, ARM error decoding, long-running
//! operation (LRO) polling and `nextLink` pagination.

use super::auth::{AmbientCredential, TokenSource};
use crate::config::Settings;
use colored::Colorize;
use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::time::Duration;

const ASYNC_OPERATION: &str = "Azure-AsyncOperation";

/// Error returned by ARM, decoded from `{"error": {"code", "message"}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmError {
    /// HTTP status, or the final poll status code for failed LROs.
    pub status: u16,
    pub code: String,
    pub message: String,
    pub url: String,
}

impl ArmError {
    /// Decode an ARM error body, falling back to the raw text.
    pub fn from_body(status: u16, url: &str, body: &str) -> ArmError {
        let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
        let err = parsed
            .get("error")
            .or_else(|| parsed.get("Error"))
            .unwrap_or(&parsed);
        let code = err["code"].as_str().unwrap_or("Unknown").to_string();
        let message = match err["message"].as_str() {
            Some(m) => m.to_string(),
            None if !body.trim().is_empty() && parsed.is_null() => body.trim().to_string(),
            None => "unknown error".to_string(),
        };
        ArmError {
            status,
            code,
            message,
            url: url.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND.as_u16()
    }
}

impl fmt::Display for ArmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ARM request {} failed: status {} {}: {}",
            self.url, self.status, self.code, self.message
        )
    }
}

impl Error for ArmError {}

/// Where to poll a long-running operation.
#[derive(Debug, Clone, PartialEq)]
enum PollTarget {
    /// Operation status resource returning `{"status": ..}`.
    AsyncOperation(String),
    /// Location URL returning 202 while running and 200/204 when done.
    Location(String),
    /// The resource itself, until its `provisioningState` is terminal.
    ResourceState(String),
    /// The resource itself, until it returns 404.
    ResourceGone(String),
}

impl PollTarget {
    fn from_headers(headers: &HeaderMap) -> Option<PollTarget> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };
        header(ASYNC_OPERATION)
            .map(PollTarget::AsyncOperation)
            .or_else(|| header("Location").map(PollTarget::Location))
    }

    fn url(&self) -> &str {
        match self {
            PollTarget::AsyncOperation(url)
            | PollTarget::Location(url)
            | PollTarget::ResourceState(url)
            | PollTarget::ResourceGone(url) => url,
        }
    }
}

/// Client for the ARM management endpoint.
pub struct ArmClient {
    client: reqwest::Client,
    token: Box<dyn TokenSource>,
    endpoint: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl ArmClient {
    /// Client authenticating with the ambient Azure credential chain.
    pub fn new(settings: &Settings) -> ArmClient {
        ArmClient::with_token_source(settings, Box::new(AmbientCredential::new()))
    }

    pub fn with_token_source(settings: &Settings, token: Box<dyn TokenSource>) -> ArmClient {
        ArmClient {
            client: reqwest::Client::new(),
            token,
            endpoint: settings.arm_endpoint.trim_end_matches('/').to_string(),
            poll_interval: settings.poll_interval,
            max_polls: settings.max_polls,
        }
    }

    /// Absolute URL for a resource path, e.g. `/subscriptions/..`.
    pub fn url(&self, path: &str, api_version: &str) -> String {
        let sep = if path.contains('?') { '&' } else { '?' };
        format!("{}{path}{sep}api-version={api_version}", self.endpoint)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Response, Box<dyn Error>> {
        let token = self.token.token().await?;
        log::debug!("ARM {method} {url}", url = url.on_blue());

        let mut request = self.client.request(method.clone(), url).bearer_auth(token);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }
        let response = request.send().await.map_err(|e| {
            log::error!("ARM {method} {url} transport error: {e}");
            format!("Failed to send {method} {url}: {e}")
        })?;
        log::debug!("ARM {method} {url} -> {}", response.status());
        Ok(response)
    }

    /// Read the body of a non-success response into an [`ArmError`].
    async fn error_from(response: Response, url: &str) -> Box<dyn Error> {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let err = ArmError::from_body(status, url, &body);
        log::warn!(
            "{failed} {url}: {code} {message}",
            failed = "failed".on_red(),
            code = err.code,
            message = err.message
        );
        Box::new(err)
    }

    /// `PUT` a resource and wait for the operation to finish.
    ///
    /// Returns the resource as read back after completion. A 202 without
    /// an operation header is followed by polling the resource itself.
    pub async fn put_and_wait<B, T>(
        &self,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<T, Box<dyn Error>>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = self.url(path, api_version);
        let payload = serde_json::to_vec(body)
            .map_err(|e| format!("Error serializing body for {url}: {e}"))?;
        let response = self.send(Method::PUT, &url, Some(payload)).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from(response, &url).await);
        }

        let target = PollTarget::from_headers(response.headers());
        let in_progress = status == StatusCode::ACCEPTED
            || (status == StatusCode::CREATED
                && matches!(target, Some(PollTarget::AsyncOperation(_))));
        if in_progress {
            let target = target.unwrap_or_else(|| {
                log::debug!("PUT {url}: 202 without operation header, polling the resource");
                PollTarget::ResourceState(url.clone())
            });
            self.wait_for_operation(&target, retry_after(response.headers())).await?;
            return self.get(path, api_version).await;
        }

        let text = response.text().await?;
        parse_json(&text, &url)
    }

    /// `GET` a single resource.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<T, Box<dyn Error>> {
        let url = self.url(path, api_version);
        self.get_url(&url).await
    }

    async fn get_url<T: DeserializeOwned>(&self, url: &str) -> Result<T, Box<dyn Error>> {
        let response = self.send(Method::GET, url, None).await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response, url).await);
        }
        let text = response.text().await?;
        parse_json(&text, url)
    }

    /// `DELETE` a resource and wait for the operation to finish.
    ///
    /// A 404 counts as already deleted. A 202 without an operation header is
    /// followed by polling the resource until it is gone.
    pub async fn delete_and_wait(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<(), Box<dyn Error>> {
        let url = self.url(path, api_version);
        let response = self.send(Method::DELETE, &url, None).await?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => {
                log::warn!("DELETE {url}: not found, treating as deleted");
                Ok(())
            }
            StatusCode::ACCEPTED => {
                let target = PollTarget::from_headers(response.headers()).unwrap_or_else(|| {
                    log::debug!("DELETE {url}: 202 without operation header, polling the resource");
                    PollTarget::ResourceGone(url.clone())
                });
                self.wait_for_operation(&target, retry_after(response.headers())).await
            }
            _ => Err(Self::error_from(response, &url).await),
        }
    }

    /// `GET` a collection, following `nextLink` until exhausted.
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<Vec<T>, Box<dyn Error>> {
        let mut items = Vec::new();
        let mut seen_links = HashSet::new();
        let mut next = Some(self.url(path, api_version));
        let mut block = 0;

        while let Some(url) = next {
            let page: crate::models::Page<T> = self.get_url(&url).await?;
            let count = page.value.len();
            items.extend(page.value);

            if let Some(link) = &page.next_link {
                if !seen_links.insert(link.clone()) {
                    let msg = format!("nextLink not unique - possible infinite loop: {link}");
                    return Err(msg.into());
                }
            }
            log::debug!(
                "list block#{block:2} record_count=+{count:3} => {total:3}",
                total = items.len()
            );
            next = page.next_link;
            block += 1;
        }
        Ok(items)
    }

    /// Poll an LRO until it reaches a terminal state.
    async fn wait_for_operation(
        &self,
        target: &PollTarget,
        first_delay: Option<Duration>,
    ) -> Result<(), Box<dyn Error>> {
        let mut delay = first_delay.unwrap_or(self.poll_interval);

        for poll in 1..=self.max_polls {
            tokio::time::sleep(delay).await;

            let response = self.send(Method::GET, target.url(), None).await?;
            let status = response.status();
            delay = retry_after(response.headers()).unwrap_or(self.poll_interval);

            if status == StatusCode::NOT_FOUND && matches!(target, PollTarget::ResourceGone(_)) {
                return Ok(());
            }
            if !status.is_success() {
                return Err(Self::error_from(response, target.url()).await);
            }

            match target {
                PollTarget::AsyncOperation(url) => {
                    let text = response.text().await?;
                    let body: Value = parse_json(&text, url)?;
                    match body["status"].as_str().unwrap_or("Unknown") {
                        "Succeeded" => return Ok(()),
                        state @ ("Failed" | "Canceled") => {
                            let mut err = ArmError::from_body(status.as_u16(), url, &text);
                            err.message = format!("operation {state}: {}", err.message);
                            return Err(Box::new(err));
                        }
                        state => log::debug!("poll#{poll} {url}: {state}"),
                    }
                }
                PollTarget::Location(url) => {
                    if status != StatusCode::ACCEPTED {
                        return Ok(());
                    }
                    log::debug!("poll#{poll} {url}: still running");
                }
                PollTarget::ResourceState(url) => {
                    let text = response.text().await?;
                    let body: Value = parse_json(&text, url)?;
                    match body["properties"]["provisioningState"].as_str() {
                        None | Some("Succeeded") => return Ok(()),
                        Some(state @ ("Failed" | "Canceled")) => {
                            let mut err = ArmError::from_body(status.as_u16(), url, &text);
                            err.message = format!("provisioning {state}: {}", err.message);
                            return Err(Box::new(err));
                        }
                        Some(state) => log::debug!("poll#{poll} {url}: {state}"),
                    }
                }
                PollTarget::ResourceGone(url) => {
                    log::debug!("poll#{poll} {url}: still present");
                }
            }

            if poll % 10 == 0 {
                log::info!("Still waiting for operation after {poll} polls: {}", target.url());
            }
        }

        Err(format!(
            "Operation timed out after {} polls: {}",
            self.max_polls,
            target.url()
        )
        .into())
    }
}

/// `Retry-After` in seconds, if present.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Deserialize a response body, reporting the JSON path on failure.
fn parse_json<T: DeserializeOwned>(text: &str, url: &str) -> Result<T, Box<dyn Error>> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    let parsed: T = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        log::error!("BODY START:\n\n{}\n\nBODY END\n", text);
        format!("Error parsing response from {url}: path={} error={}", e.path(), e)
    })?;
    Ok(parsed)
}
