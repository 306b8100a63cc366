use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{Lead, LeadSource, LeadStatus};
use crate::error::ApiError;
use crate::filter::{self, LeadFilter, SqlParam};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

/// Columns the list endpoint may sort by. Anything else falls back to
/// `created_at` rather than erroring.
const SORT_COLUMNS: [&str; 8] = [
    "created_at",
    "updated_at",
    "first_name",
    "last_name",
    "email",
    "score",
    "lead_value",
    "last_activity_at",
];

/// Validated payload for creating a lead
#[derive(Debug, Clone)]
pub struct NewLead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub city: String,
    pub state: String,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub score: i32,
    pub lead_value: f64,
    pub is_qualified: bool,
    pub last_activity_at: Option<DateTime<Utc>>,
}

/// Partial update: only set fields change
#[derive(Debug, Clone, Default)]
pub struct LeadChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub source: Option<LeadSource>,
    pub status: Option<LeadStatus>,
    pub score: Option<i32>,
    pub lead_value: Option<f64>,
    pub is_qualified: Option<bool>,
    pub last_activity_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListOptions {
    pub page: i64,
    pub limit: i64,
    pub sort: String,
    pub order: SortOrder,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            sort: "created_at".to_string(),
            order: SortOrder::Desc,
        }
    }
}

impl ListOptions {
    pub fn from_raw(
        page: Option<i64>,
        limit: Option<i64>,
        sort: Option<&str>,
        order: Option<&str>,
    ) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: clamp_limit(limit),
            sort: sort_column(sort).to_string(),
            order: match order {
                Some(o) if o.eq_ignore_ascii_case("asc") => SortOrder::Asc,
                _ => SortOrder::Desc,
            },
        }
    }

    fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

fn sort_column(sort: Option<&str>) -> &'static str {
    match sort {
        Some(s) => SORT_COLUMNS
            .iter()
            .find(|c| **c == s)
            .copied()
            .unwrap_or("created_at"),
        None => "created_at",
    }
}

/// One page of leads plus the numbers needed for pagination metadata
#[derive(Debug)]
pub struct LeadPage {
    pub leads: Vec<Lead>,
    pub total_count: i64,
    pub page: i64,
    pub limit: i64,
}

impl LeadPage {
    pub fn total_pages(&self) -> i64 {
        if self.total_count == 0 {
            0
        } else {
            (self.total_count + self.limit - 1) / self.limit
        }
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev_page(&self) -> bool {
        self.page > 1
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStats {
    pub total_leads: i64,
    pub average_score: f64,
    pub total_lead_value: f64,
    pub qualified_leads: i64,
    pub status_breakdown: BTreeMap<String, i64>,
    pub source_breakdown: BTreeMap<String, i64>,
}

#[derive(sqlx::FromRow)]
struct StatsTotals {
    total: i64,
    qualified: i64,
    avg_score: f64,
    total_value: f64,
}

pub struct LeadStore<'a> {
    pool: &'a PgPool,
}

impl<'a> LeadStore<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner_id: Uuid, lead: NewLead) -> Result<Lead, ApiError> {
        let created = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (
                owner_id, first_name, last_name, email, phone, company,
                city, state, source, status, score, lead_value,
                is_qualified, last_activity_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.company)
        .bind(&lead.city)
        .bind(&lead.state)
        .bind(lead.source)
        .bind(lead.status)
        .bind(lead.score)
        .bind(lead.lead_value)
        .bind(lead.is_qualified)
        .bind(lead.last_activity_at)
        .fetch_one(self.pool)
        .await?;
        Ok(created)
    }

    pub async fn list(
        &self,
        owner_id: Uuid,
        filter: &LeadFilter,
        opts: &ListOptions,
    ) -> Result<LeadPage, ApiError> {
        let compiled = filter::compile(owner_id, filter)?;

        let count_sql = format!(
            "SELECT COUNT(*) FROM leads WHERE {}",
            compiled.where_clause
        );
        let total_count: i64 =
            filter::bind_scalar_params(sqlx::query_scalar(&count_sql), &compiled.params)
                .fetch_one(self.pool)
                .await?;

        let list_sql = format!(
            "SELECT * FROM leads WHERE {} ORDER BY {} {} LIMIT {} OFFSET {}",
            compiled.where_clause,
            opts.sort,
            opts.order.as_sql(),
            opts.limit,
            opts.offset(),
        );
        let leads = filter::bind_params(sqlx::query_as::<_, Lead>(&list_sql), &compiled.params)
            .fetch_all(self.pool)
            .await?;

        Ok(LeadPage {
            leads,
            total_count,
            page: opts.page,
            limit: opts.limit,
        })
    }

    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Lead>, ApiError> {
        let lead =
            sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE owner_id = $1 AND id = $2")
                .bind(owner_id)
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(lead)
    }

    /// Apply a partial update. Returns None when the lead does not exist
    /// or belongs to another owner.
    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: LeadChanges,
    ) -> Result<Option<Lead>, ApiError> {
        let mut sets = vec!["updated_at = NOW()".to_string()];
        let mut params: Vec<SqlParam> = Vec::new();

        let mut set = |column: &str, param: SqlParam, params: &mut Vec<SqlParam>| {
            params.push(param);
            sets.push(format!("{column} = ${}", params.len()));
        };

        if let Some(v) = changes.first_name {
            set("first_name", SqlParam::Text(v), &mut params);
        }
        if let Some(v) = changes.last_name {
            set("last_name", SqlParam::Text(v), &mut params);
        }
        if let Some(v) = changes.email {
            set("email", SqlParam::Text(v), &mut params);
        }
        if let Some(v) = changes.phone {
            set("phone", SqlParam::Text(v), &mut params);
        }
        if let Some(v) = changes.company {
            set("company", SqlParam::Text(v), &mut params);
        }
        if let Some(v) = changes.city {
            set("city", SqlParam::Text(v), &mut params);
        }
        if let Some(v) = changes.state {
            set("state", SqlParam::Text(v), &mut params);
        }
        if let Some(v) = changes.source {
            set("source", SqlParam::Source(v), &mut params);
        }
        if let Some(v) = changes.status {
            set("status", SqlParam::Status(v), &mut params);
        }
        if let Some(v) = changes.score {
            set("score", SqlParam::Int(v), &mut params);
        }
        if let Some(v) = changes.lead_value {
            set("lead_value", SqlParam::Float(v), &mut params);
        }
        if let Some(v) = changes.is_qualified {
            set("is_qualified", SqlParam::Bool(v), &mut params);
        }
        if let Some(v) = changes.last_activity_at {
            set("last_activity_at", SqlParam::Timestamp(v), &mut params);
        }

        let owner_n = params.len() + 1;
        let id_n = params.len() + 2;
        let sql = format!(
            "UPDATE leads SET {} WHERE owner_id = ${owner_n} AND id = ${id_n} RETURNING *",
            sets.join(", "),
        );

        let updated = filter::bind_params(sqlx::query_as::<_, Lead>(&sql), &params)
            .bind(owner_id)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(updated)
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM leads WHERE owner_id = $1 AND id = $2")
            .bind(owner_id)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Duplicate-email pre-check, optionally ignoring one record (the one
    /// being updated)
    pub async fn email_taken(
        &self,
        owner_id: Uuid,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, ApiError> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM leads
                WHERE owner_id = $1 AND email = $2 AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(owner_id)
        .bind(email)
        .bind(exclude)
        .fetch_one(self.pool)
        .await?;
        Ok(taken)
    }

    pub async fn stats(&self, owner_id: Uuid) -> Result<LeadStats, ApiError> {
        let totals = sqlx::query_as::<_, StatsTotals>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE is_qualified) AS qualified,
                COALESCE(AVG(score), 0)::float8 AS avg_score,
                COALESCE(SUM(lead_value), 0)::float8 AS total_value
            FROM leads
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(self.pool)
        .await?;

        let status_rows: Vec<(LeadStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM leads WHERE owner_id = $1 GROUP BY status",
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        let source_rows: Vec<(LeadSource, i64)> = sqlx::query_as(
            "SELECT source, COUNT(*) FROM leads WHERE owner_id = $1 GROUP BY source",
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        Ok(LeadStats {
            total_leads: totals.total,
            average_score: (totals.avg_score * 100.0).round() / 100.0,
            total_lead_value: totals.total_value,
            qualified_leads: totals.qualified,
            status_breakdown: status_rows
                .into_iter()
                .map(|(s, n)| (s.as_str().to_string(), n))
                .collect(),
            source_breakdown: source_rows
                .into_iter()
                .map(|(s, n)| (s.as_str().to_string(), n))
                .collect(),
        })
    }
}
