use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Where a lead came from. Stored as text in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Website,
    FacebookAds,
    GoogleAds,
    Referral,
    Events,
    Other,
}

impl LeadSource {
    pub const ALL: [&'static str; 6] = [
        "website",
        "facebook_ads",
        "google_ads",
        "referral",
        "events",
        "other",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::Website => "website",
            LeadSource::FacebookAds => "facebook_ads",
            LeadSource::GoogleAds => "google_ads",
            LeadSource::Referral => "referral",
            LeadSource::Events => "events",
            LeadSource::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "website" => Some(LeadSource::Website),
            "facebook_ads" => Some(LeadSource::FacebookAds),
            "google_ads" => Some(LeadSource::GoogleAds),
            "referral" => Some(LeadSource::Referral),
            "events" => Some(LeadSource::Events),
            "other" => Some(LeadSource::Other),
            _ => None,
        }
    }
}

/// Pipeline state of a lead. Stored as text in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Lost,
    Won,
}

impl LeadStatus {
    pub const ALL: [&'static str; 5] = ["new", "contacted", "qualified", "lost", "won"];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Lost => "lost",
            LeadStatus::Won => "won",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(LeadStatus::New),
            "contacted" => Some(LeadStatus::Contacted),
            "qualified" => Some(LeadStatus::Qualified),
            "lost" => Some(LeadStatus::Lost),
            "won" => Some(LeadStatus::Won),
            _ => None,
        }
    }
}

impl Default for LeadStatus {
    fn default() -> Self {
        LeadStatus::New
    }
}

/// Sales-prospect record owned by a user. Email is unique per owner,
/// not globally.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lead {
    pub id: Uuid,
    pub owner_id: Uuid,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
