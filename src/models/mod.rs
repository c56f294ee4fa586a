//! Database models and DTOs for all domain entities.

pub mod category;
pub mod comment;
pub mod export;
pub mod pagination;
pub mod post;
pub mod user;
