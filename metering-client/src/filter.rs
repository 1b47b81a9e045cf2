use serde::Serialize;
use serde_json::Value;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// A single field-level match condition.
///
/// `OneOf` selects records whose field equals any of the listed values.
/// `Range` selects records whose field falls inside the (optional) bounds,
/// lower bound inclusive, upper bound exclusive, matching the half-open
/// interval convention used for reading periods.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Matcher {
    OneOf(Vec<Value>),
    Range {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<Value>,
    },
}

#[derive(Debug, Clone, Serialize)]
struct Clause {
    field: String,
    #[serde(flatten)]
    matcher: Matcher,
}

/// An ordered set of match conditions, combined with AND by the remote API.
///
/// Built by the caller, consumed once per search/delete call.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct SearchFilter {
    clauses: Vec<Clause>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-set membership on `field`.
    pub fn one_of<I, S>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(|v| Value::String(v.into())).collect();
        self.clauses.push(Clause {
            field: field.to_string(),
            matcher: Matcher::OneOf(values),
        });
        self
    }

    /// Timestamp interval membership on `field`: `min <= field < max`.
    pub fn period_between(mut self, field: &str, min: OffsetDateTime, max: OffsetDateTime) -> Self {
        self.clauses.push(Clause {
            field: field.to_string(),
            matcher: Matcher::Range {
                min: Some(timestamp_value(min)),
                max: Some(timestamp_value(max)),
            },
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

fn timestamp_value(ts: OffsetDateTime) -> Value {
    // Rfc3339 formatting only fails for years outside 0..=9999.
    Value::String(ts.format(&Rfc3339).expect("timestamp not representable as RFC 3339"))
}

/// Paging and ordering options for a single search call.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub take: usize,
    pub skip: usize,
    pub order_by: Vec<String>,
}

impl SearchOptions {
    pub fn new(take: usize, skip: usize, order_by: &[&str]) -> Self {
        Self {
            take,
            skip,
            order_by: order_by.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Query-string pairs understood by the remote API.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("take".to_string(), self.take.to_string()),
            ("skip".to_string(), self.skip.to_string()),
        ];
        if !self.order_by.is_empty() {
            pairs.push(("orderBy".to_string(), self.order_by.join(",")));
        }
        pairs
    }
}
