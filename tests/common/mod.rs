use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();
static CREDENTIALS_SERVER: OnceLock<TestServer> = OnceLock::new();

/// End-to-end tests need a reachable Postgres; skip cleanly when the
/// environment does not provide one.
pub fn test_env_ready() -> bool {
    std::env::var("DATABASE_URL").is_ok()
}

pub struct TestServer {
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn(extra_env: &[(&str, &str)]) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        let mut cmd = Command::new("target/debug/calendar-api");
        cmd.env("PORT", port.to_string())
            .env("JWT_SECRET", "integration-test-secret")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        for (key, value) in extra_env {
            cmd.env(key, value);
        }

        // Inherit environment so the server sees DATABASE_URL
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

#[allow(dead_code)]
pub async fn ensure_server() -> Result<&'static TestServer> {
    let server =
        SERVER.get_or_init(|| TestServer::spawn(&[]).expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Separate server instance running the credentialed signup/signin mode.
#[allow(dead_code)]
pub async fn ensure_credentials_server() -> Result<&'static TestServer> {
    let server = CREDENTIALS_SERVER.get_or_init(|| {
        TestServer::spawn(&[("CALENDAR_AUTH_MODE", "credentials")])
            .expect("failed to spawn server binary")
    });
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Name-only logins start as viewers; post mutation tests need an editor.
/// Promoted directly in the store, since the only API path is admin-gated.
#[allow(dead_code)]
pub async fn promote_to_editor(user_id: &str) -> Result<()> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await?;
    sqlx::query("UPDATE users SET role = 'editor' WHERE id = $1::uuid")
        .bind(user_id)
        .execute(&pool)
        .await?;
    Ok(())
}

/// Log in with a fresh random name and return (token, user id).
#[allow(dead_code)]
pub async fn login(base_url: &str, name: &str) -> Result<(String, String)> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/auth/login", base_url))
        .json(&serde_json::json!({ "name": name }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

    let body: serde_json::Value = res.json().await?;
    let token = body["token"].as_str().context("missing token")?.to_string();
    let user_id = body["user"]["id"].as_str().context("missing user id")?.to_string();
    Ok((token, user_id))
}
