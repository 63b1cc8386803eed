pub mod comment_service;
pub mod notification_service;
pub mod post_service;
pub mod session_service;
