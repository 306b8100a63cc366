use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::User;
use crate::store::LeadPage;

/// Page metadata returned alongside list results
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub limit: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl From<&LeadPage> for Pagination {
    fn from(page: &LeadPage) -> Self {
        Self {
            current_page: page.page,
            total_pages: page.total_pages(),
            total_count: page.total_count,
            limit: page.limit,
            has_next_page: page.has_next_page(),
            has_prev_page: page.has_prev_page(),
        }
    }
}

/// User payload safe to return to clients. Timestamps are only included
/// on the `me` endpoint.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PublicUser {
    pub fn summary(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn detailed(user: &User) -> Self {
        Self {
            created_at: Some(user.created_at),
            updated_at: Some(user.updated_at),
            ..Self::summary(user)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_for_second_of_two_pages() {
        let page = LeadPage {
            leads: Vec::new(),
            total_count: 25,
            page: 2,
            limit: 20,
        };
        let p = Pagination::from(&page);
        assert_eq!(
            p,
            Pagination {
                current_page: 2,
                total_pages: 2,
                total_count: 25,
                limit: 20,
                has_next_page: false,
                has_prev_page: true,
            }
        );
    }

    #[test]
    fn pagination_keys_are_camel_case() {
        let page = LeadPage {
            leads: Vec::new(),
            total_count: 1,
            page: 1,
            limit: 20,
        };
        let value = serde_json::to_value(Pagination::from(&page)).unwrap();
        assert!(value.get("currentPage").is_some());
        assert!(value.get("hasNextPage").is_some());
        assert!(value.get("total_pages").is_none());
    }

    #[test]
    fn summary_user_omits_timestamps() {
        let user = User {
            id: Uuid::nil(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "secret".into(),
            role: "user".into(),
            refresh_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(PublicUser::summary(&user)).unwrap();
        assert!(value.get("createdAt").is_none());
        assert!(value.get("password_hash").is_none());

        let value = serde_json::to_value(PublicUser::detailed(&user)).unwrap();
        assert!(value.get("createdAt").is_some());
    }
}
