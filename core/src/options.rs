//! Per-call option structs and their precondition checks.
//!
//! # Design
//! Every options kind implements `Validate`, which classifies a value as
//! `Valid`, `Absent` or `Incomplete`. `Option<T>` implements it too, so a
//! missing options value is a distinct variant rather than a crash. Both
//! `Absent` and `Incomplete` map to the same
//! `ValidationError::RequiredFieldsMissing`.
//!
//! The 120-day range limit and the 366-row batch limit are separate checks
//! that only make sense once the options are valid.

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::query::{QueryField, QueryParams, QueryValue};

/// Maximum number of rows accepted by a single upload call.
pub const MAX_ROWS_PER_CALL: usize = 366;

/// Maximum span, in whole days, of a range-bounded query.
pub const MAX_DAYS_RANGE: i64 = 120;

/// Outcome of validating an options value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    /// No options were supplied.
    Absent,
    /// Options were supplied without these required fields.
    Incomplete(Vec<&'static str>),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    /// Collapse into the error returned to callers.
    pub fn into_result(self) -> Result<(), ValidationError> {
        match self {
            Validation::Valid => Ok(()),
            Validation::Absent => {
                tracing::debug!("options absent");
                Err(ValidationError::RequiredFieldsMissing)
            }
            Validation::Incomplete(missing) => {
                tracing::debug!(?missing, "options missing required fields");
                Err(ValidationError::RequiredFieldsMissing)
            }
        }
    }
}

/// Required-field check for an options struct.
pub trait Validate {
    fn validate(&self) -> Validation;

    fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Validation {
        match self {
            Some(options) => options.validate(),
            None => Validation::Absent,
        }
    }
}

impl<T: Validate + ?Sized> Validate for &T {
    fn validate(&self) -> Validation {
        (**self).validate()
    }
}

/// Options for unit-scoped operations such as rule management.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Required.
    pub external_unit_id: Option<String>,
    pub external_section_id: Option<String>,
}

impl RequestOptions {
    pub fn for_unit(unit: impl Into<String>) -> Self {
        Self {
            external_unit_id: Some(unit.into()),
            external_section_id: None,
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.external_section_id = Some(section.into());
        self
    }
}

impl Validate for RequestOptions {
    fn validate(&self) -> Validation {
        if self.external_unit_id.is_none() {
            return Validation::Incomplete(vec!["externalUnitId"]);
        }
        Validation::Valid
    }
}

impl QueryParams for RequestOptions {
    const FIELDS: &'static [QueryField<Self>] = &[
        QueryField {
            key: "externalSectionId",
            omit_empty: false,
            value: |o| QueryValue::opt_str(o.external_section_id.as_deref()),
        },
        QueryField {
            key: "externalUnitId",
            omit_empty: false,
            value: |o| QueryValue::opt_str(o.external_unit_id.as_deref()),
        },
    ];
}

/// Options for range-bounded queries over forecast data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestRangeOptions {
    /// Required.
    pub start_time: Option<DateTime<Utc>>,
    /// Required.
    pub end_time: Option<DateTime<Utc>>,
    pub external_section_id: Option<String>,
    /// Required.
    pub external_unit_id: Option<String>,
}

impl RequestRangeOptions {
    pub fn new(unit: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start_time: Some(start),
            end_time: Some(end),
            external_section_id: None,
            external_unit_id: Some(unit.into()),
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.external_section_id = Some(section.into());
        self
    }

    /// Whole days between start and end, rounded down.
    ///
    /// `None` while either bound is unset.
    pub fn day_distance(&self) -> Option<i64> {
        let (start, end) = (self.start_time?, self.end_time?);
        let elapsed = end - start;
        let secs = elapsed.num_seconds() - i64::from(elapsed.subsec_nanos() < 0);
        Some(secs.div_euclid(86_400))
    }

    /// Validity followed by the maximum-span check.
    pub fn check_range(&self) -> Result<(), ValidationError> {
        self.validate().into_result()?;
        match self.day_distance() {
            Some(days) if days > MAX_DAYS_RANGE => {
                tracing::debug!(days, max = MAX_DAYS_RANGE, "date range too wide");
                Err(ValidationError::DateRangeTooWide {
                    days,
                    max: MAX_DAYS_RANGE,
                })
            }
            _ => Ok(()),
        }
    }
}

impl Validate for RequestRangeOptions {
    fn validate(&self) -> Validation {
        let mut missing = Vec::new();
        if self.start_time.is_none() {
            missing.push("startTime");
        }
        if self.end_time.is_none() {
            missing.push("endTime");
        }
        if self.external_unit_id.is_none() {
            missing.push("externalUnitId");
        }
        if missing.is_empty() {
            Validation::Valid
        } else {
            Validation::Incomplete(missing)
        }
    }
}

impl QueryParams for RequestRangeOptions {
    const FIELDS: &'static [QueryField<Self>] = &[
        QueryField {
            key: "startTime",
            omit_empty: false,
            value: |o| QueryValue::opt_time(o.start_time),
        },
        QueryField {
            key: "endTime",
            omit_empty: false,
            value: |o| QueryValue::opt_time(o.end_time),
        },
        QueryField {
            key: "externalSectionId",
            omit_empty: false,
            value: |o| QueryValue::opt_str(o.external_section_id.as_deref()),
        },
        QueryField {
            key: "externalUnitId",
            omit_empty: false,
            value: |o| QueryValue::opt_str(o.external_unit_id.as_deref()),
        },
    ];
}

/// Query parameters of the actual/budget upload endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadParams {
    pub append_data: bool,
}

impl QueryParams for UploadParams {
    const FIELDS: &'static [QueryField<Self>] = &[QueryField {
        key: "appendData",
        omit_empty: false,
        value: |p| QueryValue::Bool(p.append_data),
    }];
}

/// Reject batches longer than `MAX_ROWS_PER_CALL`.
pub fn check_batch_size(rows: usize) -> Result<(), ValidationError> {
    if rows > MAX_ROWS_PER_CALL {
        tracing::debug!(rows, max = MAX_ROWS_PER_CALL, "batch too large");
        return Err(ValidationError::TooManyRows {
            rows,
            max: MAX_ROWS_PER_CALL,
        });
    }
    Ok(())
}
