//! Request construction and response decoding shared by all services.
//!
//! # Design
//! `Client` holds the base URL, the user agent and a shared `Transport`;
//! it keeps no per-call state, so one instance can serve concurrent
//! callers. Every service method runs the same pipeline: validate options,
//! `new_request`, attach body and query, then `execute` (typed body) or
//! `execute_empty` (body discarded). Both extract the request UID from the
//! response so it reaches the caller on success and on failure.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{DecodeError, Error, Result};
use crate::forecast::ForecastService;
use crate::http::{CallContext, HttpMethod, HttpRequest, HttpResponse};
use crate::tags::TagsService;
use crate::transport::{Transport, UreqTransport};

/// Response header carrying the correlation identifier.
pub const REQUEST_UID_HEADER: &str = "X-Quinyx-Request-Uid";

/// Body field used for the correlation identifier when the header is missing.
const REQUEST_UID_FIELD: &str = "requestUid";

/// Metadata of a completed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// Correlation identifier; empty when the server sent none.
    pub request_uid: String,
}

/// Client for the Quinyx API.
#[derive(Clone)]
pub struct Client {
    base_url: Url,
    user_agent: String,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Build a client over an already-authenticated transport.
    pub fn new(config: ClientConfig, transport: impl Transport + 'static) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        Ok(Self {
            base_url,
            user_agent: config.user_agent,
            transport: Arc::new(transport),
        })
    }

    /// Build a client using `UreqTransport` and a pre-acquired bearer token.
    pub fn with_ureq(config: ClientConfig, bearer_token: Option<String>) -> Result<Self> {
        let mut transport = UreqTransport::new(config.timeout);
        if let Some(token) = bearer_token {
            transport = transport.with_bearer_token(token);
        }
        Self::new(config, transport)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn tags(&self) -> TagsService<'_> {
        TagsService::new(self)
    }

    pub fn forecast(&self) -> ForecastService<'_> {
        ForecastService::new(self)
    }

    /// Resolve `path` against the base URL. No body, no query.
    pub fn new_request(&self, method: HttpMethod, path: &str) -> Result<HttpRequest> {
        if path.starts_with('/') {
            return Err(Error::InvalidPath(path.to_string()));
        }
        let url = self
            .base_url
            .join(path)
            .map_err(|_| Error::InvalidPath(path.to_string()))?;
        Ok(self.request_for(method, url))
    }

    /// Append `segments` to the base URL, percent-encoding each one, so a
    /// caller-supplied id cannot add path levels, a query or a fragment.
    pub fn new_request_segments(
        &self,
        method: HttpMethod,
        segments: &[&str],
    ) -> Result<HttpRequest> {
        // `extend` silently drops dot segments.
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || matches!(**s, "." | ".."))
        {
            return Err(Error::InvalidPath((*bad).to_string()));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidPath(segments.join("/")))?
            .pop_if_empty()
            .extend(segments);
        Ok(self.request_for(method, url))
    }

    fn request_for(&self, method: HttpMethod, url: Url) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: vec![
                ("accept".to_string(), "application/json".to_string()),
                ("user-agent".to_string(), self.user_agent.clone()),
            ],
            body: None,
        }
    }

    /// Send `request` and decode a 2xx JSON body into `T`.
    pub fn execute<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        request: HttpRequest,
    ) -> Result<(T, Response)> {
        let (raw, response) = self.round_trip(ctx, &request)?;
        let value = serde_json::from_str(&raw.body).map_err(|e| {
            tracing::debug!(
                request_uid = %response.request_uid,
                error = %e,
                "response body did not decode"
            );
            Error::Decode {
                request_uid: response.request_uid.clone(),
                source: DecodeError::Json(e),
            }
        })?;
        Ok((value, response))
    }

    /// Send `request`, check the status and discard the body.
    pub fn execute_empty(&self, ctx: &CallContext, request: HttpRequest) -> Result<Response> {
        self.round_trip(ctx, &request).map(|(_, response)| response)
    }

    fn round_trip(
        &self,
        ctx: &CallContext,
        request: &HttpRequest,
    ) -> Result<(HttpResponse, Response)> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        let raw = self.transport.send(request, ctx).map_err(|e| {
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                error = %e,
                "transport failed"
            );
            Error::Transport(e)
        })?;

        let response = Response {
            status: raw.status,
            request_uid: request_uid(&raw),
        };
        tracing::debug!(
            status = response.status,
            request_uid = %response.request_uid,
            "received response"
        );

        if !raw.is_success() {
            tracing::warn!(
                method = %request.method,
                url = %request.url,
                status = response.status,
                request_uid = %response.request_uid,
                "API returned error status"
            );
            return Err(Error::Api {
                status: response.status,
                message: error_message(&raw),
                request_uid: response.request_uid,
            });
        }
        Ok((raw, response))
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let invalid = |reason: &str| Error::InvalidBaseUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };
    if !raw.ends_with('/') {
        return Err(invalid("must end with '/'"));
    }
    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("cannot be used as a base"));
    }
    Ok(url)
}

/// Correlation identifier from the header, else from a JSON body field.
fn request_uid(response: &HttpResponse) -> String {
    if let Some(uid) = response.header(REQUEST_UID_HEADER) {
        return uid.to_string();
    }
    body_field(&response.body, REQUEST_UID_FIELD).unwrap_or_default()
}

fn error_message(response: &HttpResponse) -> String {
    body_field(&response.body, "message").unwrap_or_else(|| response.body.trim().to_string())
}

fn body_field(body: &str, field: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get(field)?.as_str().map(str::to_string)
}
