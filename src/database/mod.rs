pub mod comments;
pub mod mentions;
pub mod models;
pub mod pool;
pub mod posts;
pub mod sessions;
pub mod users;

pub use comments::CommentRepo;
pub use mentions::MentionRepo;
pub use pool::{create_pool, health_check, run_migrations};
pub use posts::{NewPost, PostFilter, PostPatch, PostRepo};
pub use sessions::SessionRepo;
pub use users::UserRepo;
