use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::info;

use crate::auth::{generate_jwt, Claims};
use crate::config::SecurityConfig;
use crate::database::models::User;
use crate::database::{SessionRepo, UserRepo};
use crate::error::ApiError;
use crate::state::AppState;

/// Session engine: token issuance, sign-in/out flows and the lazy cleanup of
/// expired sessions. One instance per request, over the shared pool.
pub struct SessionService {
    pool: PgPool,
    security: SecurityConfig,
}

impl SessionService {
    pub fn new(state: &AppState) -> Self {
        Self { pool: state.pool.clone(), security: state.config.security.clone() }
    }

    fn users(&self) -> UserRepo {
        UserRepo::new(self.pool.clone())
    }

    fn sessions(&self) -> SessionRepo {
        SessionRepo::new(self.pool.clone())
    }

    /// Sign a token for the user and persist the matching session row.
    pub async fn issue_session(&self, user: &User) -> Result<String, ApiError> {
        let ttl_days = self.security.session_ttl_days;
        let claims = Claims::new(user.id, user.email.clone(), user.role, ttl_days);
        let token = generate_jwt(&claims, &self.security.jwt_secret).map_err(|e| {
            tracing::error!("Token generation failed: {}", e);
            ApiError::internal_server_error("Failed to create session")
        })?;

        let expires_at = Utc::now() + Duration::days(ttl_days);
        self.sessions().create(user.id, &token, expires_at).await?;
        Ok(token)
    }

    /// Frictionless login: find or create the user by display name, drop
    /// their expired sessions, issue a fresh one.
    pub async fn login_by_name(&self, name: &str) -> Result<(String, User), ApiError> {
        let users = self.users();

        let user = match users.find_by_name(name).await? {
            Some(user) => user,
            None => {
                let email = placeholder_email(name);
                let avatar_url = avatar_url_for(&email);
                let user = users.create(&email, name, None, Some(&avatar_url)).await?;
                info!("Created user '{}' on first login", name);
                user
            }
        };

        self.sessions().purge_expired(user.id).await?;
        let token = self.issue_session(&user).await?;
        Ok((token, user))
    }

    /// Credentialed signup. Conflict on a duplicate email regardless of the
    /// other fields.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<(String, User), ApiError> {
        let users = self.users();

        if users.find_by_email(email).await?.is_some() {
            return Err(ApiError::conflict("User already exists"));
        }

        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ApiError::internal_server_error("Failed to create account")
        })?;

        let avatar_url = avatar_url_for(email);
        let user = users.create(email, name, Some(&hash), Some(&avatar_url)).await?;

        let token = self.issue_session(&user).await?;
        Ok((token, user))
    }

    /// Credentialed sign-in. Unknown email and wrong password produce the
    /// same response.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(String, User), ApiError> {
        let user = self
            .users()
            .find_by_email(email)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

        let valid = user
            .password_hash
            .as_deref()
            .map(|hash| bcrypt::verify(password, hash).unwrap_or(false))
            .unwrap_or(false);

        if !valid {
            return Err(ApiError::unauthorized("Invalid credentials"));
        }

        self.sessions().purge_expired(user.id).await?;
        let token = self.issue_session(&user).await?;
        Ok((token, user))
    }

    /// Delete the session row for the presented token. The caller was already
    /// authenticated, so a row that vanished in between is tolerated.
    pub async fn sign_out(&self, token: &str) -> Result<(), ApiError> {
        self.sessions().delete_by_token(token).await?;
        Ok(())
    }
}

/// Synthesized address for name-only accounts; doubles as the avatar seed.
fn placeholder_email(name: &str) -> String {
    let slug: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '.' })
        .collect();
    format!("{}@calendar.local", slug)
}

fn avatar_url_for(seed: &str) -> String {
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", seed)
}
