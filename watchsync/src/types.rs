pub mod content_id;
pub mod user_identity;
