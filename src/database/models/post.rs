use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "platform")]
pub enum Platform {
    TikTok,
    X,
    LinkedIn,
    Instagram,
}

/// Content category tag for a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "pillar")]
pub enum Pillar {
    #[sqlx(rename = "Life_at_a_Startup")]
    #[serde(rename = "Life_at_a_Startup")]
    LifeAtAStartup,
    #[sqlx(rename = "How_to_Build_and_Run_a_Startup")]
    #[serde(rename = "How_to_Build_and_Run_a_Startup")]
    HowToBuildAndRunAStartup,
    #[sqlx(rename = "Industry_Insights")]
    #[serde(rename = "Industry_Insights")]
    IndustryInsights,
    #[sqlx(rename = "Product_Updates")]
    #[serde(rename = "Product_Updates")]
    ProductUpdates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "post_status")]
pub enum Status {
    Draft,
    Scheduled,
    Published,
}

impl Status {
    /// Status applied at creation when the client supplies none: posts dated
    /// in the past are already out, everything else is waiting its turn.
    pub fn default_for(publish_date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if publish_date < now {
            Status::Published
        } else {
            Status::Scheduled
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub platform: Option<Platform>,
    pub pillar: Option<Pillar>,
    pub publish_date: DateTime<Utc>,
    pub status: Status,
    pub image_url: Option<String>,
    pub assignee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post as returned by the API: row fields plus the resolved assignee and
/// comment count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub assignee: Option<UserProfile>,
    pub comment_count: i64,
}
