//! The acting user, forwarded by the upstream gateway in `X-User-Id`.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use bookdrive_core::errors::Error as CoreError;
use bookdrive_core::users::{User, UserRole};

use crate::{error::ApiError, main_lib::AppState};

pub const USER_ID_HEADER: &str = "x-user-id";

pub struct ActingUser(pub User);

impl ActingUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        self.require_any(&[UserRole::Admin], "Access denied. Admin only.")
    }

    pub fn require_admin_or_coordinator(&self) -> Result<(), ApiError> {
        self.require_any(
            &[UserRole::Admin, UserRole::Coordinator],
            "Access denied. Admin or coordinator only.",
        )
    }

    fn require_any(&self, roles: &[UserRole], message: &str) -> Result<(), ApiError> {
        if roles.contains(&self.0.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(message.to_string()))
        }
    }
}

impl FromRequestParts<Arc<AppState>> for ActingUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Access denied. No user provided.".into()))?;

        match state.user_service.get_user(user_id) {
            Ok(user) if user.is_active => Ok(ActingUser(user)),
            Ok(_) | Err(CoreError::NotFound(_)) => {
                Err(ApiError::Unauthorized("Invalid user".into()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
