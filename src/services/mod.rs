//! Business logic services.

pub mod auth;
pub mod category;
pub mod comment;
pub mod export;
pub mod page_size;
pub mod post;
pub mod post_scope;
pub mod slug;
pub mod user;
pub mod view_cache;
