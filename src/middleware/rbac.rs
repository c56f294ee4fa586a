//! Role-based access control extractors for Axum handlers.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};

use crate::errors::AppError;
use crate::middleware::auth::CurrentUser;
use crate::models::user::UserRole;
use crate::AppState;

/// Proof that the caller holds the administrative capability. Required to
/// widen a listing past the published-only default view.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess {
    _private: (),
}

impl AdminAccess {
    pub(crate) fn grant() -> Self {
        Self { _private: () }
    }
}

/// Extractor that requires the admin role.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub CurrentUser);

impl RequireAdmin {
    pub fn access(&self) -> AdminAccess {
        AdminAccess::grant()
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != UserRole::Admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(RequireAdmin(user))
    }
}

/// Extractor that requires the admin or author role.
#[derive(Debug, Clone)]
pub struct RequireAuthor(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuthor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.role.can_author() {
            return Err(AppError::Forbidden(
                "Author or admin access required".to_string(),
            ));
        }
        Ok(RequireAuthor(user))
    }
}
