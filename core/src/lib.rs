//! Synchronous client core for the Quinyx workforce-management API.
//!
//! # Overview
//! Resource services (`Client::tags`, `Client::forecast`) validate their
//! options, build an `HttpRequest`, hand it to a `Transport` and decode the
//! `HttpResponse`. Every outcome, success or failure, carries the
//! correlation identifier the server attached to the response.
//!
//! # Design
//! - `HttpRequest` / `HttpResponse` are plain data; the only I/O happens
//!   inside a `Transport`, so the core is testable without a network.
//! - `Timestamp` accepts both epoch seconds and RFC 3339 on the wire and
//!   always emits RFC 3339 UTC.
//! - Options structs declare their query fields once (`QueryParams`); the
//!   encoder emits them in declaration order.
//! - Preconditions (required fields, 120-day span, 366-row batches) are
//!   checked before a request is built. Nothing is retried.

pub mod client;
pub mod config;
pub mod error;
pub mod forecast;
pub mod http;
pub mod options;
pub mod query;
pub mod tags;
pub mod timestamp;
pub mod transport;

#[cfg(test)]
mod test_utils;

pub use client::{Client, Response, REQUEST_UID_HEADER};
pub use config::ClientConfig;
pub use error::{DecodeError, Error, Result, TransportError, ValidationError};
pub use forecast::ForecastService;
pub use http::{CallContext, HttpMethod, HttpRequest, HttpResponse};
pub use options::{
    RequestOptions, RequestRangeOptions, Validate, Validation, MAX_DAYS_RANGE, MAX_ROWS_PER_CALL,
};
pub use tags::TagsService;
pub use timestamp::Timestamp;
pub use transport::{Transport, UreqTransport};
