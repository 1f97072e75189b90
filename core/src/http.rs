//! HTTP request/response types and the per-call context.
//!
//! # Design
//! Requests and responses are plain data. `Client` builds `HttpRequest`
//! values and hands them to a `Transport`; the transport returns an
//! `HttpResponse` regardless of status, leaving status interpretation to
//! the client. All fields are owned so a request can be replayed or
//! inspected in tests.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use url::Url;

use crate::error::Error;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Serialize `body` as JSON and set the content type.
    pub fn with_json_body<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, Error> {
        let json = serde_json::to_string(body).map_err(Error::Serialization)?;
        self.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        self.body = Some(json);
        Ok(self)
    }

    /// Attach a pre-encoded query string verbatim. Empty strings clear it.
    pub fn with_query(mut self, query: &str) -> Self {
        if query.is_empty() {
            self.url.set_query(None);
        } else {
            self.url.set_query(Some(query));
        }
        self
    }

    /// Value of the first header named `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Value of the first header named `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Cancellation scope of a single call.
///
/// Transports must not send once the deadline has passed and must bound
/// the round trip by the remaining time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    deadline: Option<Instant>,
}

impl CallContext {
    /// No deadline; the transport's own timeouts apply.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|r| r.is_zero())
    }
}
