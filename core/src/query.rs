//! Query-string encoding for option structs.
//!
//! # Design
//! Each options type declares a static table of `QueryField`s: the query
//! key, whether empty values are dropped, and an accessor producing a
//! `QueryValue`. Encoding walks the table in declaration order, so the
//! resulting URL is reproducible. Absent values are never emitted.
//!
//! Time fields are written as RFC 3339 without fractional seconds, which is
//! coarser than the JSON body format in `timestamp`.

use chrono::{DateTime, SecondsFormat, Utc};
use url::form_urlencoded;

/// A single scalar value extracted from an options struct.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Absent,
    Str(String),
    Bool(bool),
    Time(DateTime<Utc>),
}

impl QueryValue {
    /// `Str` for `Some`, `Absent` for `None`.
    pub fn opt_str(value: Option<&str>) -> Self {
        value.map_or(QueryValue::Absent, |s| QueryValue::Str(s.to_string()))
    }

    /// `Time` for `Some`, `Absent` for `None`.
    pub fn opt_time(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(QueryValue::Absent, QueryValue::Time)
    }

    fn is_empty(&self) -> bool {
        match self {
            QueryValue::Absent => true,
            QueryValue::Str(s) => s.is_empty(),
            QueryValue::Bool(b) => !b,
            QueryValue::Time(_) => false,
        }
    }

    fn format(&self) -> Option<String> {
        match self {
            QueryValue::Absent => None,
            QueryValue::Str(s) => Some(s.clone()),
            QueryValue::Bool(b) => Some(b.to_string()),
            QueryValue::Time(t) => Some(t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

/// Descriptor for one query parameter of `T`.
pub struct QueryField<T> {
    pub key: &'static str,
    /// Also drop empty strings and `false`. Absent values are always dropped,
    /// so a set `Option<String>` field is sent even when it is empty.
    pub omit_empty: bool,
    pub value: fn(&T) -> QueryValue,
}

/// Types that can be encoded into query parameters.
pub trait QueryParams: Sized + 'static {
    const FIELDS: &'static [QueryField<Self>];
}

/// Encode `params` into ordered `(key, value)` pairs.
pub fn encode<T: QueryParams>(params: &T) -> Vec<(&'static str, String)> {
    T::FIELDS
        .iter()
        .filter_map(|field| {
            let value = (field.value)(params);
            if field.omit_empty && value.is_empty() {
                return None;
            }
            value.format().map(|v| (field.key, v))
        })
        .collect()
}

/// Percent-encode pairs into a query string, preserving order.
pub fn to_query_string<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key.as_ref(), value.as_ref());
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Sample {
        name: Option<String>,
        flag: bool,
        verbose: bool,
        at: Option<DateTime<Utc>>,
        note: String,
    }

    impl QueryParams for Sample {
        const FIELDS: &'static [QueryField<Self>] = &[
            QueryField {
                key: "name",
                omit_empty: false,
                value: |s| QueryValue::opt_str(s.name.as_deref()),
            },
            QueryField {
                key: "flag",
                omit_empty: false,
                value: |s| QueryValue::Bool(s.flag),
            },
            QueryField {
                key: "verbose",
                omit_empty: true,
                value: |s| QueryValue::Bool(s.verbose),
            },
            QueryField {
                key: "at",
                omit_empty: false,
                value: |s| QueryValue::opt_time(s.at),
            },
            QueryField {
                key: "note",
                omit_empty: true,
                value: |s| QueryValue::Str(s.note.clone()),
            },
        ];
    }

    fn sample() -> Sample {
        Sample {
            name: Some("a b".to_string()),
            flag: false,
            verbose: false,
            at: Some(Utc.with_ymd_and_hms(2019, 10, 12, 7, 20, 50).unwrap()),
            note: String::new(),
        }
    }

    #[test]
    fn declaration_order_and_omission() {
        let pairs = encode(&sample());
        assert_eq!(
            pairs,
            vec![
                ("name", "a b".to_string()),
                ("flag", "false".to_string()),
                ("at", "2019-10-12T07:20:50Z".to_string()),
            ]
        );
    }

    #[test]
    fn absent_values_are_skipped_even_when_required() {
        let mut s = sample();
        s.name = None;
        s.at = None;
        let keys: Vec<_> = encode(&s).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["flag"]);
    }

    #[test]
    fn time_drops_fractional_seconds() {
        let mut s = sample();
        s.at = Some(
            Utc.with_ymd_and_hms(2019, 10, 12, 7, 20, 50).unwrap()
                + chrono::Duration::milliseconds(520),
        );
        let pairs = encode(&s);
        assert!(pairs.contains(&("at", "2019-10-12T07:20:50Z".to_string())));
    }

    #[test]
    fn query_string_is_percent_encoded() {
        let qs = to_query_string(&encode(&sample()));
        assert_eq!(qs, "name=a+b&flag=false&at=2019-10-12T07%3A20%3A50Z");
    }
}
