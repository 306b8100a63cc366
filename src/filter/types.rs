use serde::Deserialize;

use crate::database::models::{LeadSource, LeadStatus};

/// Declarative per-field filter over lead records. Fields are statically
/// typed by category; an unknown field or operator fails deserialization
/// instead of being silently dropped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LeadFilter {
    pub first_name: Option<StringFilter>,
    pub last_name: Option<StringFilter>,
    pub email: Option<StringFilter>,
    pub phone: Option<StringFilter>,
    pub company: Option<StringFilter>,
    pub city: Option<StringFilter>,
    pub state: Option<StringFilter>,
    pub source: Option<EnumFilter<LeadSource>>,
    pub status: Option<EnumFilter<LeadStatus>>,
    pub score: Option<NumberFilter>,
    pub lead_value: Option<NumberFilter>,
    pub is_qualified: Option<BoolFilter>,
    pub created_at: Option<DateFilter>,
    pub updated_at: Option<DateFilter>,
    pub last_activity_at: Option<DateFilter>,
}

impl LeadFilter {
    /// Parse the JSON-encoded `filters` query parameter
    pub fn from_json(raw: &str) -> Result<Self, super::FilterError> {
        serde_json::from_str(raw).map_err(|e| super::FilterError::InvalidFilter(e.to_string()))
    }
}

/// String fields: a bare string means substring match
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringFilter {
    Contains(String),
    Ops(StringOps),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StringOps {
    pub equals: Option<String>,
    pub contains: Option<String>,
}

/// Enum fields: a bare value means exact match
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EnumFilter<T> {
    Exact(T),
    Ops(EnumOps<T>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumOps<T> {
    pub equals: Option<T>,
    #[serde(rename = "in")]
    pub any_of: Option<Vec<T>>,
}

/// Number fields: a bare number means exact match; `between` is inclusive
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberFilter {
    Exact(f64),
    Ops(NumberOps),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumberOps {
    pub equals: Option<f64>,
    pub gt: Option<f64>,
    pub lt: Option<f64>,
    pub gte: Option<f64>,
    pub lte: Option<f64>,
    pub between: Option<[f64; 2]>,
}

/// Date fields. Operands accept RFC 3339 timestamps or plain YYYY-MM-DD.
/// `on` covers the whole day starting at the given instant; `before` and
/// `after` are exclusive; `between` is inclusive on both ends.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateFilter {
    pub on: Option<String>,
    pub before: Option<String>,
    pub after: Option<String>,
    pub between: Option<[String; 2]>,
}

/// Boolean fields: a bare bool means exact match
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BoolFilter {
    Exact(bool),
    Ops(BoolOps),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoolOps {
    pub equals: Option<bool>,
}
