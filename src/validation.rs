//! Request payload validation. Each validator collects every applicable
//! error message instead of stopping at the first failure.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::database::models::{LeadSource, LeadStatus};
use crate::store::{LeadChanges, NewLead};

/// Raw lead payload as received on create and update. Enum fields stay
/// strings here so a bad value becomes a validation message rather than
/// a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub score: Option<i32>,
    pub lead_value: Option<f64>,
    pub is_qualified: Option<bool>,
    pub last_activity_at: Option<DateTime<Utc>>,
}

pub fn validate_new_lead(input: &LeadInput) -> Result<NewLead, Vec<String>> {
    let mut errors = Vec::new();

    let first_name = required_string(
        &input.first_name,
        &mut errors,
        "First name is required",
        Some((50, "First name cannot exceed 50 characters")),
    );
    let last_name = required_string(
        &input.last_name,
        &mut errors,
        "Last name is required",
        Some((50, "Last name cannot exceed 50 characters")),
    );
    let email = required_email(&input.email, &mut errors);
    let phone = required_string(
        &input.phone,
        &mut errors,
        "Phone number is required",
        Some((20, "Phone number cannot exceed 20 characters")),
    );
    let company = required_string(
        &input.company,
        &mut errors,
        "Company is required",
        Some((100, "Company name cannot exceed 100 characters")),
    );
    let city = required_string(
        &input.city,
        &mut errors,
        "City is required",
        Some((50, "City name cannot exceed 50 characters")),
    );
    let state = required_string(
        &input.state,
        &mut errors,
        "State is required",
        Some((50, "State name cannot exceed 50 characters")),
    );

    let source = match input.source.as_deref() {
        Some(s) => LeadSource::parse(s),
        None => None,
    };
    if source.is_none() {
        errors.push(format!(
            "Source must be one of: {}",
            LeadSource::ALL.join(", ")
        ));
    }

    let status = match input.status.as_deref() {
        Some(s) => {
            let parsed = LeadStatus::parse(s);
            if parsed.is_none() {
                errors.push(format!(
                    "Status must be one of: {}",
                    LeadStatus::ALL.join(", ")
                ));
            }
            parsed
        }
        None => Some(LeadStatus::default()),
    };

    let score = input.score.unwrap_or(0);
    if !(0..=100).contains(&score) {
        errors.push("Score must be a number between 0 and 100".to_string());
    }

    let lead_value = input.lead_value.unwrap_or(0.0);
    if lead_value < 0.0 {
        errors.push("Lead value must be a positive number".to_string());
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    match (
        first_name, last_name, email, phone, company, city, state, source, status,
    ) {
        (
            Some(first_name),
            Some(last_name),
            Some(email),
            Some(phone),
            Some(company),
            Some(city),
            Some(state),
            Some(source),
            Some(status),
        ) => Ok(NewLead {
            first_name,
            last_name,
            email,
            phone,
            company,
            city,
            state,
            source,
            status,
            score,
            lead_value,
            is_qualified: input.is_qualified.unwrap_or(false),
            last_activity_at: input.last_activity_at,
        }),
        // unreachable when errors is empty; report rather than panic
        _ => Err(vec!["Validation failed".to_string()]),
    }
}

/// Update variant: each rule applies only when the field is present
pub fn validate_lead_changes(input: &LeadInput) -> Result<LeadChanges, Vec<String>> {
    let mut errors = Vec::new();
    let mut changes = LeadChanges::default();

    if input.first_name.is_some() {
        changes.first_name = required_string(
            &input.first_name,
            &mut errors,
            "First name is required",
            Some((50, "First name cannot exceed 50 characters")),
        );
    }
    if input.last_name.is_some() {
        changes.last_name = required_string(
            &input.last_name,
            &mut errors,
            "Last name is required",
            Some((50, "Last name cannot exceed 50 characters")),
        );
    }
    if input.email.is_some() {
        changes.email = required_email(&input.email, &mut errors);
    }
    if input.phone.is_some() {
        changes.phone = required_string(
            &input.phone,
            &mut errors,
            "Phone number is required",
            Some((20, "Phone number cannot exceed 20 characters")),
        );
    }
    if input.company.is_some() {
        changes.company = required_string(
            &input.company,
            &mut errors,
            "Company is required",
            Some((100, "Company name cannot exceed 100 characters")),
        );
    }
    if input.city.is_some() {
        changes.city = required_string(
            &input.city,
            &mut errors,
            "City is required",
            Some((50, "City name cannot exceed 50 characters")),
        );
    }
    if input.state.is_some() {
        changes.state = required_string(
            &input.state,
            &mut errors,
            "State is required",
            Some((50, "State name cannot exceed 50 characters")),
        );
    }

    if let Some(raw) = input.source.as_deref() {
        match LeadSource::parse(raw) {
            Some(source) => changes.source = Some(source),
            None => errors.push(format!(
                "Source must be one of: {}",
                LeadSource::ALL.join(", ")
            )),
        }
    }
    if let Some(raw) = input.status.as_deref() {
        match LeadStatus::parse(raw) {
            Some(status) => changes.status = Some(status),
            None => errors.push(format!(
                "Status must be one of: {}",
                LeadStatus::ALL.join(", ")
            )),
        }
    }

    if let Some(score) = input.score {
        if (0..=100).contains(&score) {
            changes.score = Some(score);
        } else {
            errors.push("Score must be a number between 0 and 100".to_string());
        }
    }
    if let Some(value) = input.lead_value {
        if value >= 0.0 {
            changes.lead_value = Some(value);
        } else {
            errors.push("Lead value must be a positive number".to_string());
        }
    }

    changes.is_qualified = input.is_qualified;
    changes.last_activity_at = input.last_activity_at;

    if errors.is_empty() {
        Ok(changes)
    } else {
        Err(errors)
    }
}

pub fn validate_registration(
    name: Option<&str>,
    email: Option<&str>,
    password: Option<&str>,
) -> Vec<String> {
    let mut errors = Vec::new();

    match name.map(str::trim) {
        None | Some("") => errors.push("Name is required".to_string()),
        Some(n) if n.chars().count() > 100 => {
            errors.push("Name cannot exceed 100 characters".to_string());
        }
        _ => {}
    }
    match email.map(str::trim) {
        None | Some("") => errors.push("Email is required".to_string()),
        Some(e) if !is_valid_email(e) => {
            errors.push("Please provide a valid email address".to_string());
        }
        _ => {}
    }
    match password {
        None | Some("") => errors.push("Password is required".to_string()),
        Some(p) if p.len() < 8 => {
            errors.push("Password must be at least 8 characters".to_string());
        }
        _ => {}
    }

    errors
}

pub fn validate_login(email: Option<&str>, password: Option<&str>) -> Vec<String> {
    let mut errors = Vec::new();
    if email.map_or(true, |e| e.trim().is_empty()) {
        errors.push("Email is required".to_string());
    }
    if password.map_or(true, str::is_empty) {
        errors.push("Password is required".to_string());
    }
    errors
}

/// Normalize an email for storage and comparison
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required_string(
    value: &Option<String>,
    errors: &mut Vec<String>,
    required_msg: &str,
    max: Option<(usize, &str)>,
) -> Option<String> {
    let trimmed = value.as_deref().map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        errors.push(required_msg.to_string());
        return None;
    }
    if let Some((limit, msg)) = max {
        if trimmed.chars().count() > limit {
            errors.push(msg.to_string());
            return None;
        }
    }
    Some(trimmed.to_string())
}

fn required_email(value: &Option<String>, errors: &mut Vec<String>) -> Option<String> {
    let trimmed = value.as_deref().map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        errors.push("Email is required".to_string());
        return None;
    }
    if !is_valid_email(trimmed) {
        errors.push("Please provide a valid email address".to_string());
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Minimal shape check: one `@`, non-empty local part, dot in the domain
fn is_valid_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    if s.chars().any(char::is_whitespace) || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_input() -> LeadInput {
        LeadInput {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: Some("Ada@Example.com".into()),
            phone: Some("555-0100".into()),
            company: Some("Analytical Engines".into()),
            city: Some("London".into()),
            state: Some("LDN".into()),
            source: Some("referral".into()),
            status: None,
            score: None,
            lead_value: None,
            is_qualified: None,
            last_activity_at: None,
        }
    }

    #[test]
    fn valid_create_applies_defaults() {
        let lead = validate_new_lead(&full_input()).unwrap();
        assert_eq!(lead.email, "ada@example.com");
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.score, 0);
        assert_eq!(lead.lead_value, 0.0);
        assert!(!lead.is_qualified);
    }

    #[test]
    fn create_collects_all_errors() {
        let input = LeadInput {
            email: Some("not-an-email".into()),
            score: Some(150),
            lead_value: Some(-1.0),
            ..Default::default()
        };
        let errors = validate_new_lead(&input).unwrap_err();
        assert!(errors.contains(&"First name is required".to_string()));
        assert!(errors.contains(&"Please provide a valid email address".to_string()));
        assert!(errors.contains(&"Score must be a number between 0 and 100".to_string()));
        assert!(errors.contains(&"Lead value must be a positive number".to_string()));
        assert!(errors.len() >= 9);
    }

    #[test]
    fn score_boundaries_are_accepted() {
        let mut input = full_input();
        input.score = Some(0);
        assert!(validate_new_lead(&input).is_ok());
        input.score = Some(100);
        assert!(validate_new_lead(&input).is_ok());
        input.score = Some(101);
        assert!(validate_new_lead(&input).is_err());
    }

    #[test]
    fn max_lengths_are_enforced() {
        let mut input = full_input();
        input.first_name = Some("x".repeat(51));
        let errors = validate_new_lead(&input).unwrap_err();
        assert_eq!(errors, vec!["First name cannot exceed 50 characters"]);

        input.first_name = Some("x".repeat(50));
        assert!(validate_new_lead(&input).is_ok());
    }

    #[test]
    fn update_ignores_absent_fields() {
        let input = LeadInput {
            score: Some(42),
            ..Default::default()
        };
        let changes = validate_lead_changes(&input).unwrap();
        assert_eq!(changes.score, Some(42));
        assert!(changes.first_name.is_none());
        assert!(changes.email.is_none());
    }

    #[test]
    fn update_rejects_bad_present_fields() {
        let input = LeadInput {
            status: Some("paused".into()),
            first_name: Some("   ".into()),
            ..Default::default()
        };
        let errors = validate_lead_changes(&input).unwrap_err();
        assert!(errors.contains(&"First name is required".to_string()));
        assert!(errors
            .contains(&"Status must be one of: new, contacted, qualified, lost, won".to_string()));
    }

    #[test]
    fn email_shape_rules() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("a@.co"));
    }

    #[test]
    fn registration_rules() {
        let errors = validate_registration(None, Some("bad"), Some("1234567"));
        assert!(errors.contains(&"Name is required".to_string()));
        assert!(errors.contains(&"Please provide a valid email address".to_string()));
        assert!(errors.contains(&"Password must be at least 8 characters".to_string()));

        let errors = validate_registration(Some(&"x".repeat(101)), Some("a@b.co"), Some("longenough"));
        assert_eq!(errors, vec!["Name cannot exceed 100 characters"]);

        assert!(validate_registration(Some("Ada"), Some("a@b.co"), Some("longenough")).is_empty());
    }
}
