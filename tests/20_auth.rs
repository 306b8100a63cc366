mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn register_login_me_logout_flow() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let (client, email) = common::register_user(server, "flow").await?;

    // session cookie from registration works immediately
    let res = client
        .get(format!("{}/api/auth/me", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["user"]["email"], email.to_lowercase());
    assert!(body["user"]["createdAt"].is_string());
    assert!(body["user"].get("password_hash").is_none());

    // fresh client can log in with the same credentials
    let client2 = common::client();
    let res = client2
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({"email": email, "password": "hunter22"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // logout clears the session
    let res = client2
        .post(format!("{}/api/auth/logout", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client2
        .get(format!("{}/api/auth/me", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let (_, email) = common::register_user(server, "dup").await?;

    let res = common::client()
        .post(format!("{}/api/auth/register", server.base_url))
        .json(&json!({"name": "Again", "email": email, "password": "hunter22"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn registration_validation_collects_errors() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;

    let res = common::client()
        .post(format!("{}/api/auth/register", server.base_url))
        .json(&json!({"email": "not-an-email", "password": "123"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], false);
    let errors = body["errors"].as_array().expect("errors array");
    assert_eq!(errors.len(), 3);
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let (_, email) = common::register_user(server, "wrongpw").await?;

    let res = common::client()
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({"email": email, "password": "not-the-password"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "Invalid email or password");
    Ok(())
}

#[tokio::test]
async fn refresh_rotates_the_session() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let (client, _) = common::register_user(server, "refresh").await?;

    let res = client
        .post(format!("{}/api/auth/refresh", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "Tokens refreshed successfully");

    // rotated cookies keep the session alive
    let res = client
        .get(format!("{}/api/auth/me", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn old_refresh_token_rejected_after_rotation() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = common::client();
    let email = common::unique_email("rotate");

    let res = client
        .post(format!("{}/api/auth/register", server.base_url))
        .json(&json!({"name": "Test User", "email": email, "password": "hunter22"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let old_refresh = refresh_cookie_value(&res).expect("refresh cookie set on register");

    // rotation replaces the stored token
    let res = client
        .post(format!("{}/api/auth/refresh", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // the pre-rotation token is still within its TTL but must be rejected,
    // since only the most recently issued refresh token is stored
    let res = reqwest::Client::new()
        .post(format!("{}/api/auth/refresh", server.base_url))
        .header(
            reqwest::header::COOKIE,
            format!("refreshToken={old_refresh}"),
        )
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "Invalid refresh token");
    Ok(())
}

fn refresh_cookie_value(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|c| c.starts_with("refreshToken="))
        .and_then(|c| c.split(';').next())
        .map(|kv| kv.trim_start_matches("refreshToken=").to_string())
}

#[tokio::test]
async fn refresh_without_cookie_is_unauthorized() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;

    let res = common::client()
        .post(format!("{}/api/auth/refresh", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_session() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = common::client();

    for url in [
        format!("{}/api/auth/me", server.base_url),
        format!("{}/api/leads", server.base_url),
        format!("{}/api/leads/stats", server.base_url),
    ] {
        let res = client.get(&url).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "GET {url}");
    }
    Ok(())
}
