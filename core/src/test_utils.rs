//! In-memory transport for unit tests.

use std::sync::{Arc, Mutex};

use crate::client::{Client, REQUEST_UID_HEADER};
use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::http::{CallContext, HttpRequest, HttpResponse};
use crate::transport::Transport;

pub(crate) const TEST_BASE_URL: &str = "https://api.example.com/v2/";
pub(crate) const TEST_UID: &str = "uid-123";

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;

/// Records every request and answers through a handler.
pub(crate) struct StubTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub(crate) fn new(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError>
            + Send
            + Sync
            + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Always answer `status` with `body` and the test request UID.
    pub(crate) fn json(status: u16, body: &str) -> Arc<Self> {
        let body = body.to_string();
        Self::new(move |_| {
            Ok(HttpResponse {
                status,
                headers: vec![(REQUEST_UID_HEADER.to_string(), TEST_UID.to_string())],
                body: body.clone(),
            })
        })
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> HttpRequest {
        self.requests()
            .pop()
            .expect("no request was sent")
    }

    /// Query parameter `key` of the last request.
    pub(crate) fn last_query(&self, key: &str) -> Option<String> {
        self.last_request()
            .url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

impl Transport for StubTransport {
    fn send(
        &self,
        request: &HttpRequest,
        _ctx: &CallContext,
    ) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(request)
    }
}

pub(crate) fn client_with(stub: &Arc<StubTransport>) -> Client {
    let config = ClientConfig::default().with_base_url(TEST_BASE_URL);
    Client::new(config, Arc::clone(stub)).unwrap()
}

pub(crate) fn ctx() -> CallContext {
    CallContext::background()
}
