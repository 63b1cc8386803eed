pub mod comment;
pub mod post;
pub mod session;
pub mod user;

pub use comment::{Comment, CommentView, Mention};
pub use post::{Pillar, Platform, Post, PostView, Status};
pub use session::Session;
pub use user::{Role, User, UserProfile};
