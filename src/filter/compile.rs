use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::Postgres;
use uuid::Uuid;

use super::{
    BoolFilter, DateFilter, EnumFilter, FilterError, LeadFilter, NumberFilter, StringFilter,
};
use crate::database::models::{LeadSource, LeadStatus};

/// A positional bind value for a compiled WHERE clause. Keeping the
/// concrete type lets the query bind with the right Postgres type
/// instead of stringifying everything.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i32),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    Source(LeadSource),
    Status(LeadStatus),
}

/// Output of filter compilation: a WHERE clause body with `$n`
/// placeholders and the values to bind, in placeholder order.
#[derive(Debug)]
pub struct CompiledFilter {
    pub where_clause: String,
    pub params: Vec<SqlParam>,
}

/// Compile a lead filter into SQL conditions scoped to one owner.
/// The owner condition is always present and always `$1`, so a filter
/// can never widen the result set beyond the caller's records.
pub fn compile(owner_id: Uuid, filter: &LeadFilter) -> Result<CompiledFilter, FilterError> {
    let mut c = Compiler::new();
    c.push("owner_id", "=", SqlParam::Uuid(owner_id));

    for (column, f) in [
        ("first_name", &filter.first_name),
        ("last_name", &filter.last_name),
        ("email", &filter.email),
        ("phone", &filter.phone),
        ("company", &filter.company),
        ("city", &filter.city),
        ("state", &filter.state),
    ] {
        if let Some(f) = f {
            c.string_field(column, f);
        }
    }

    if let Some(f) = &filter.source {
        c.enum_field("source", f, SqlParam::Source);
    }
    if let Some(f) = &filter.status {
        c.enum_field("status", f, SqlParam::Status);
    }

    if let Some(f) = &filter.score {
        c.number_field("score", f);
    }
    if let Some(f) = &filter.lead_value {
        c.number_field("lead_value", f);
    }

    if let Some(f) = &filter.is_qualified {
        let value = match f {
            BoolFilter::Exact(b) => Some(*b),
            BoolFilter::Ops(ops) => ops.equals,
        };
        if let Some(b) = value {
            c.push("is_qualified", "=", SqlParam::Bool(b));
        }
    }

    for (column, f) in [
        ("created_at", &filter.created_at),
        ("updated_at", &filter.updated_at),
        ("last_activity_at", &filter.last_activity_at),
    ] {
        if let Some(f) = f {
            c.date_field(column, f)?;
        }
    }

    Ok(c.finish())
}

struct Compiler {
    conditions: Vec<String>,
    params: Vec<SqlParam>,
}

impl Compiler {
    fn new() -> Self {
        Self {
            conditions: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Append a binary condition, returning the placeholder index used
    fn push(&mut self, column: &str, op: &str, param: SqlParam) {
        self.params.push(param);
        let n = self.params.len();
        self.conditions.push(format!("{column} {op} ${n}"));
    }

    fn string_field(&mut self, column: &str, f: &StringFilter) {
        match f {
            StringFilter::Contains(needle) => {
                self.push(column, "ILIKE", SqlParam::Text(like_pattern(needle)));
            }
            StringFilter::Ops(ops) => {
                if let Some(eq) = &ops.equals {
                    self.push(column, "=", SqlParam::Text(eq.clone()));
                }
                if let Some(needle) = &ops.contains {
                    self.push(column, "ILIKE", SqlParam::Text(like_pattern(needle)));
                }
            }
        }
    }

    fn enum_field<T: Copy>(
        &mut self,
        column: &str,
        f: &EnumFilter<T>,
        wrap: impl Fn(T) -> SqlParam,
    ) {
        match f {
            EnumFilter::Exact(v) => self.push(column, "=", wrap(*v)),
            EnumFilter::Ops(ops) => {
                if let Some(eq) = ops.equals {
                    self.push(column, "=", wrap(eq));
                }
                if let Some(values) = &ops.any_of {
                    if values.is_empty() {
                        // nothing can match an empty set
                        self.conditions.push("1 = 0".to_string());
                    } else {
                        let mut placeholders = Vec::with_capacity(values.len());
                        for v in values {
                            self.params.push(wrap(*v));
                            placeholders.push(format!("${}", self.params.len()));
                        }
                        self.conditions
                            .push(format!("{column} IN ({})", placeholders.join(", ")));
                    }
                }
            }
        }
    }

    fn number_field(&mut self, column: &str, f: &NumberFilter) {
        match f {
            NumberFilter::Exact(v) => self.push(column, "=", SqlParam::Float(*v)),
            NumberFilter::Ops(ops) => {
                if let Some(v) = ops.equals {
                    self.push(column, "=", SqlParam::Float(v));
                }
                if let Some(v) = ops.gt {
                    self.push(column, ">", SqlParam::Float(v));
                }
                if let Some(v) = ops.lt {
                    self.push(column, "<", SqlParam::Float(v));
                }
                if let Some(v) = ops.gte {
                    self.push(column, ">=", SqlParam::Float(v));
                }
                if let Some(v) = ops.lte {
                    self.push(column, "<=", SqlParam::Float(v));
                }
                if let Some([lo, hi]) = ops.between {
                    self.push(column, ">=", SqlParam::Float(lo));
                    self.push(column, "<=", SqlParam::Float(hi));
                }
            }
        }
    }

    fn date_field(&mut self, column: &str, f: &DateFilter) -> Result<(), FilterError> {
        if let Some(raw) = &f.on {
            // [instant, instant + 1 day)
            let start = parse_instant(raw)?;
            let end = start + Duration::days(1);
            self.push(column, ">=", SqlParam::Timestamp(start));
            self.push(column, "<", SqlParam::Timestamp(end));
        }
        if let Some(raw) = &f.before {
            self.push(column, "<", SqlParam::Timestamp(parse_instant(raw)?));
        }
        if let Some(raw) = &f.after {
            self.push(column, ">", SqlParam::Timestamp(parse_instant(raw)?));
        }
        if let Some([lo, hi]) = &f.between {
            self.push(column, ">=", SqlParam::Timestamp(parse_instant(lo)?));
            self.push(column, "<=", SqlParam::Timestamp(parse_instant(hi)?));
        }
        Ok(())
    }

    fn finish(self) -> CompiledFilter {
        CompiledFilter {
            where_clause: self.conditions.join(" AND "),
            params: self.params,
        }
    }
}

/// Escape LIKE metacharacters in user input, then wrap for substring match
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Accept an RFC 3339 timestamp or a plain calendar date (UTC midnight)
fn parse_instant(raw: &str) -> Result<DateTime<Utc>, FilterError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(DateTime::from_naive_utc_and_offset(midnight, Utc));
        }
    }
    Err(FilterError::InvalidDate(raw.to_string()))
}

/// Bind compiled params onto a `query_as` in placeholder order
pub fn bind_params<'q, T>(
    mut query: sqlx::query::QueryAs<'q, Postgres, T, sqlx::postgres::PgArguments>,
    params: &'q [SqlParam],
) -> sqlx::query::QueryAs<'q, Postgres, T, sqlx::postgres::PgArguments>
where
    T: for<'r> sqlx::FromRow<'r, PgRow>,
{
    for p in params {
        query = match p {
            SqlParam::Text(v) => query.bind(v),
            SqlParam::Int(v) => query.bind(v),
            SqlParam::Float(v) => query.bind(v),
            SqlParam::Bool(v) => query.bind(v),
            SqlParam::Timestamp(v) => query.bind(v),
            SqlParam::Uuid(v) => query.bind(v),
            SqlParam::Source(v) => query.bind(*v),
            SqlParam::Status(v) => query.bind(*v),
        };
    }
    query
}

/// Same as [`bind_params`] but for scalar `query_scalar` queries
pub fn bind_scalar_params<'q, T>(
    mut query: sqlx::query::QueryScalar<'q, Postgres, T, sqlx::postgres::PgArguments>,
    params: &'q [SqlParam],
) -> sqlx::query::QueryScalar<'q, Postgres, T, sqlx::postgres::PgArguments> {
    for p in params {
        query = match p {
            SqlParam::Text(v) => query.bind(v),
            SqlParam::Int(v) => query.bind(v),
            SqlParam::Float(v) => query.bind(v),
            SqlParam::Bool(v) => query.bind(v),
            SqlParam::Timestamp(v) => query.bind(v),
            SqlParam::Uuid(v) => query.bind(v),
            SqlParam::Source(v) => query.bind(*v),
            SqlParam::Status(v) => query.bind(*v),
        };
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn owner() -> Uuid {
        Uuid::nil()
    }

    #[test]
    fn empty_filter_is_owner_scope_only() {
        let compiled = compile(owner(), &LeadFilter::default()).unwrap();
        assert_eq!(compiled.where_clause, "owner_id = $1");
        assert_eq!(compiled.params, vec![SqlParam::Uuid(owner())]);
    }

    #[test]
    fn contains_becomes_escaped_ilike() {
        let filter = LeadFilter::from_json(r#"{"company": "50%_off"}"#).unwrap();
        let compiled = compile(owner(), &filter).unwrap();
        assert_eq!(compiled.where_clause, "owner_id = $1 AND company ILIKE $2");
        assert_eq!(
            compiled.params[1],
            SqlParam::Text("%50\\%\\_off%".to_string())
        );
    }

    #[test]
    fn number_between_is_inclusive() {
        let filter = LeadFilter::from_json(r#"{"score": {"between": [40, 70]}}"#).unwrap();
        let compiled = compile(owner(), &filter).unwrap();
        assert_eq!(
            compiled.where_clause,
            "owner_id = $1 AND score >= $2 AND score <= $3"
        );
        assert_eq!(compiled.params[1], SqlParam::Float(40.0));
        assert_eq!(compiled.params[2], SqlParam::Float(70.0));
    }

    #[test]
    fn date_on_is_half_open_day_range() {
        let filter = LeadFilter::from_json(r#"{"created_at": {"on": "2026-03-05"}}"#).unwrap();
        let compiled = compile(owner(), &filter).unwrap();
        assert_eq!(
            compiled.where_clause,
            "owner_id = $1 AND created_at >= $2 AND created_at < $3"
        );
        let start = Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 6, 0, 0, 0).unwrap();
        assert_eq!(compiled.params[1], SqlParam::Timestamp(start));
        assert_eq!(compiled.params[2], SqlParam::Timestamp(end));
    }

    #[test]
    fn date_before_is_exclusive() {
        let filter = LeadFilter::from_json(r#"{"created_at": {"before": "2026-01-01"}}"#).unwrap();
        let compiled = compile(owner(), &filter).unwrap();
        assert_eq!(compiled.where_clause, "owner_id = $1 AND created_at < $2");
    }

    #[test]
    fn enum_in_expands_placeholders() {
        let filter = LeadFilter::from_json(r#"{"status": {"in": ["won", "lost"]}}"#).unwrap();
        let compiled = compile(owner(), &filter).unwrap();
        assert_eq!(
            compiled.where_clause,
            "owner_id = $1 AND status IN ($2, $3)"
        );
        assert_eq!(compiled.params[1], SqlParam::Status(LeadStatus::Won));
        assert_eq!(compiled.params[2], SqlParam::Status(LeadStatus::Lost));
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let filter = LeadFilter::from_json(r#"{"source": {"in": []}}"#).unwrap();
        let compiled = compile(owner(), &filter).unwrap();
        assert_eq!(compiled.where_clause, "owner_id = $1 AND 1 = 0");
        assert_eq!(compiled.params.len(), 1);
    }

    #[test]
    fn bad_date_operand_errors() {
        let filter = LeadFilter::from_json(r#"{"created_at": {"after": "yesterday"}}"#).unwrap();
        assert!(matches!(
            compile(owner(), &filter),
            Err(FilterError::InvalidDate(_))
        ));
    }

    #[test]
    fn bool_and_enum_exact_forms() {
        let filter =
            LeadFilter::from_json(r#"{"is_qualified": true, "source": "referral"}"#).unwrap();
        let compiled = compile(owner(), &filter).unwrap();
        assert_eq!(
            compiled.where_clause,
            "owner_id = $1 AND source = $2 AND is_qualified = $3"
        );
        assert_eq!(compiled.params[1], SqlParam::Source(LeadSource::Referral));
        assert_eq!(compiled.params[2], SqlParam::Bool(true));
    }
}
