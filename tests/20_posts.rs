mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn listing_returns_pagination_envelope() -> Result<()> {
    if !common::test_env_ready() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (token, _) = common::login(&server.base_url, &unique_name()).await?;

    let res = client
        .get(format!("{}/posts", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await?;
    assert!(body["posts"].is_array());
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 20);
    assert!(body["pagination"]["total"].is_number());
    assert!(body["pagination"]["pages"].is_number());
    Ok(())
}

#[tokio::test]
async fn viewers_cannot_create_posts() -> Result<()> {
    if !common::test_env_ready() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Name-only logins start as viewers
    let (token, _) = common::login(&server.base_url, &unique_name()).await?;

    let res = client
        .post(format!("{}/posts", server.base_url))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "title": "Launch teaser",
            "description": "<p>coming soon</p>",
            "publishDate": "2030-01-01T12:00:00Z"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn analytics_summary_has_all_aggregates() -> Result<()> {
    if !common::test_env_ready() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (token, _) = common::login(&server.base_url, &unique_name()).await?;

    let res = client
        .get(format!("{}/posts/analytics/summary", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await?;
    assert!(body["byStatus"].is_object());
    assert!(body["byPlatform"].is_object());
    assert!(body["byPillar"].is_object());
    assert!(body["thisMonth"].is_number());
    Ok(())
}

#[tokio::test]
async fn bulk_as_viewer_is_forbidden() -> Result<()> {
    if !common::test_env_ready() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (token, _) = common::login(&server.base_url, &unique_name()).await?;

    let res = client
        .post(format!("{}/posts/bulk", server.base_url))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "postIds": [], "action": "publish" }))
        .send()
        .await?;
    // The role gate runs before payload validation
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn bulk_requires_at_least_one_id() -> Result<()> {
    if !common::test_env_ready() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let token = editor_token(&server.base_url).await?;

    let res = client
        .post(format!("{}/posts/bulk", server.base_url))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "postIds": [], "action": "publish" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = res.json().await?;
    assert!(body["field_errors"]["postIds"].is_string());
    Ok(())
}

#[tokio::test]
async fn bulk_publish_marks_every_supplied_post() -> Result<()> {
    if !common::test_env_ready() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let token = editor_token(&server.base_url).await?;
    let a = create_post(&server.base_url, &token, "Draft").await?;
    let b = create_post(&server.base_url, &token, "Scheduled").await?;

    let res = client
        .post(format!("{}/posts/bulk", server.base_url))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "postIds": [a, b], "action": "publish" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["affected"], 2);

    for id in [&a, &b] {
        let res = client
            .get(format!("{}/posts/{}", server.base_url, id))
            .bearer_auth(&token)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
        let post: serde_json::Value = res.json().await?;
        assert_eq!(post["status"], "Published");
    }
    Ok(())
}

#[tokio::test]
async fn bulk_reschedule_without_date_mutates_nothing() -> Result<()> {
    if !common::test_env_ready() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let token = editor_token(&server.base_url).await?;
    let id = create_post(&server.base_url, &token, "Scheduled").await?;

    let res = client
        .post(format!("{}/posts/bulk", server.base_url))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "postIds": [id], "action": "reschedule" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = res.json().await?;
    assert!(body["field_errors"]["publishDate"].is_string());

    // The post is untouched by the failed action
    let res = client
        .get(format!("{}/posts/{}", server.base_url, id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let post: serde_json::Value = res.json().await?;
    assert_eq!(post["status"], "Scheduled");
    assert_eq!(post["publishDate"], "2030-06-01T12:00:00Z");
    Ok(())
}

/// Fresh login promoted to editor, since mutation routes gate on the role.
async fn editor_token(base_url: &str) -> Result<String> {
    let (token, user_id) = common::login(base_url, &unique_name()).await?;
    common::promote_to_editor(&user_id).await?;
    Ok(token)
}

async fn create_post(base_url: &str, token: &str, status: &str) -> Result<String> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/posts", base_url))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "title": format!("Bulk target {}", unique_name()),
            "description": "<p>bulk fixture</p>",
            "publishDate": "2030-06-01T12:00:00Z",
            "status": status
        }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "create failed: {}",
        res.status()
    );
    let body: serde_json::Value = res.json().await?;
    Ok(body["id"].as_str().expect("post id").to_string())
}

fn unique_name() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    format!("it-user-{:x}", nanos)
}
