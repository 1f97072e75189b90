//! The network boundary.
//!
//! `Client` never performs I/O itself; it hands each `HttpRequest` to a
//! `Transport`. Authentication belongs to the transport: an OAuth2 token
//! is acquired elsewhere and handed to `UreqTransport::with_bearer_token`.

use std::sync::Arc;
use std::time::Duration;

use crate::error::TransportError;
use crate::http::{CallContext, HttpMethod, HttpRequest, HttpResponse};

/// Executes requests against the network.
///
/// Implementations return every HTTP status as data. They must honor the
/// context deadline and never retry on their own.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest, ctx: &CallContext)
        -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(
        &self,
        request: &HttpRequest,
        ctx: &CallContext,
    ) -> Result<HttpResponse, TransportError> {
        (**self).send(request, ctx)
    }
}

/// Blocking transport backed by a `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    bearer_token: Option<String>,
    /// Round-trip cap the agent was built with.
    timeout: Option<Duration>,
}

impl UreqTransport {
    /// Agent that reports 4xx/5xx as responses, bounded by `timeout`.
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self {
            timeout,
            ..Self::from_agent(agent)
        }
    }

    /// Wrap an existing agent. It must be configured with
    /// `http_status_as_error(false)`. Calls with a deadline are bounded by
    /// the remaining time only.
    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self {
            agent,
            bearer_token: None,
            timeout: None,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    fn authorization(&self) -> Option<String> {
        self.bearer_token.as_ref().map(|t| format!("Bearer {t}"))
    }

    /// Per-call timeout: the shorter of the deadline's remaining time and
    /// the configured cap. `None` leaves the agent's setting in place.
    fn call_timeout(&self, remaining: Option<Duration>) -> Option<Duration> {
        let remaining = remaining?;
        Some(self.timeout.map_or(remaining, |cap| cap.min(remaining)))
    }
}

impl Transport for UreqTransport {
    fn send(
        &self,
        request: &HttpRequest,
        ctx: &CallContext,
    ) -> Result<HttpResponse, TransportError> {
        if ctx.is_expired() {
            return Err(TransportError::DeadlineExceeded);
        }
        let call_timeout = self.call_timeout(ctx.remaining());

        let url = request.url.as_str();
        let mut headers = request.headers.clone();
        if let Some(auth) = self.authorization() {
            headers.push(("authorization".to_string(), auth));
        }

        macro_rules! prepare {
            ($builder:expr) => {{
                let mut builder = $builder;
                for (name, value) in &headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                if call_timeout.is_some() {
                    builder = builder.config().timeout_global(call_timeout).build();
                }
                builder
            }};
        }

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => prepare!(self.agent.get(url)).call(),
            (HttpMethod::Delete, _) => prepare!(self.agent.delete(url)).call(),
            (HttpMethod::Post, Some(body)) => prepare!(self.agent.post(url)).send(body.as_bytes()),
            (HttpMethod::Post, None) => prepare!(self.agent.post(url)).send_empty(),
            (HttpMethod::Put, Some(body)) => prepare!(self.agent.put(url)).send(body.as_bytes()),
            (HttpMethod::Put, None) => prepare!(self.agent.put(url)).send_empty(),
        };
        let mut response = result.map_err(map_ureq_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(map_ureq_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_ureq_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::Io(e) => TransportError::Io(e.to_string()),
        other @ (ureq::Error::ConnectionFailed | ureq::Error::HostNotFound) => {
            TransportError::Connection(other.to_string())
        }
        other => TransportError::Io(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use url::Url;

    #[test]
    fn expired_context_never_sends() {
        let transport = UreqTransport::new(None);
        let request = HttpRequest {
            method: HttpMethod::Get,
            // Unroutable; reaching the network would fail differently.
            url: Url::parse("http://127.0.0.1:9/tags/categories").unwrap(),
            headers: Vec::new(),
            body: None,
        };
        let ctx = CallContext::with_deadline(Instant::now() - Duration::from_millis(1));
        assert_eq!(
            transport.send(&request, &ctx).unwrap_err(),
            TransportError::DeadlineExceeded
        );
    }

    #[test]
    fn bearer_token_becomes_authorization_header() {
        let transport = UreqTransport::new(None).with_bearer_token("tok");
        assert_eq!(transport.authorization().as_deref(), Some("Bearer tok"));
        assert_eq!(UreqTransport::new(None).authorization(), None);
    }

    #[test]
    fn deadline_never_lifts_the_configured_cap() {
        let capped = UreqTransport::new(Some(Duration::from_secs(30)));
        assert_eq!(
            capped.call_timeout(Some(Duration::from_secs(600))),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            capped.call_timeout(Some(Duration::from_secs(5))),
            Some(Duration::from_secs(5))
        );
        assert_eq!(capped.call_timeout(None), None);

        let uncapped = UreqTransport::new(None);
        assert_eq!(
            uncapped.call_timeout(Some(Duration::from_secs(600))),
            Some(Duration::from_secs(600))
        );
    }
}
