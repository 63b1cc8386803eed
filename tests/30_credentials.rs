mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn signup_then_signin_round_trips() -> Result<()> {
    if !common::test_env_ready() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_credentials_server().await?;
    let client = reqwest::Client::new();

    let email = format!("it-{}@example.com", unique_suffix());
    let res = client
        .post(format!("{}/auth/signup", server.base_url))
        .json(&serde_json::json!({
            "email": email,
            "password": "hunter2hunter2",
            "name": "Cred User"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await?;
    assert!(body["token"].is_string());
    let user_id = body["user"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["role"], "viewer");

    let res = client
        .post(format!("{}/auth/signin", server.base_url))
        .json(&serde_json::json!({ "email": email, "password": "hunter2hunter2" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["user"]["id"], serde_json::Value::String(user_id));
    assert_eq!(body["user"]["role"], "viewer");
    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts_regardless_of_other_fields() -> Result<()> {
    if !common::test_env_ready() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_credentials_server().await?;
    let client = reqwest::Client::new();

    let email = format!("it-{}@example.com", unique_suffix());
    let signup = |password: &str, name: &str| {
        serde_json::json!({ "email": email, "password": password, "name": name })
    };

    let res = client
        .post(format!("{}/auth/signup", server.base_url))
        .json(&signup("first-password", "First Name"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(format!("{}/auth/signup", server.base_url))
        .json(&signup("other-password", "Other Name"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_identical() -> Result<()> {
    if !common::test_env_ready() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_credentials_server().await?;
    let client = reqwest::Client::new();

    let email = format!("it-{}@example.com", unique_suffix());
    let res = client
        .post(format!("{}/auth/signup", server.base_url))
        .json(&serde_json::json!({
            "email": email,
            "password": "correct-password",
            "name": "Cred User"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let wrong = client
        .post(format!("{}/auth/signin", server.base_url))
        .json(&serde_json::json!({ "email": email, "password": "wrong-password" }))
        .send()
        .await?;
    let unknown = client
        .post(format!("{}/auth/signin", server.base_url))
        .json(&serde_json::json!({
            "email": format!("nobody-{}@example.com", unique_suffix()),
            "password": "wrong-password"
        }))
        .send()
        .await?;

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);

    let wrong_body: serde_json::Value = wrong.json().await?;
    let unknown_body: serde_json::Value = unknown.json().await?;
    assert_eq!(wrong_body["error"], unknown_body["error"]);
    Ok(())
}

#[tokio::test]
async fn short_password_fails_with_field_errors() -> Result<()> {
    if !common::test_env_ready() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_credentials_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/signup", server.base_url))
        .json(&serde_json::json!({
            "email": format!("it-{}@example.com", unique_suffix()),
            "password": "short",
            "name": "Cred User"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = res.json().await?;
    assert!(body["field_errors"]["password"].is_string());
    Ok(())
}

#[tokio::test]
async fn name_only_login_is_absent_in_credentials_mode() -> Result<()> {
    if !common::test_env_ready() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_credentials_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&serde_json::json!({ "name": "Anyone" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

fn unique_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    format!("{:x}", nanos)
}
