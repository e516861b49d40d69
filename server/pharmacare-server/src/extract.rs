//! Actor context extraction.
//!
//! Authentication itself happens upstream at the gateway; by the time a
//! request reaches this service the gateway has stamped `x-user-id` and
//! `x-user-role` headers. The extractor rejects requests without an actor.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::ApiError;

/// Role the gateway resolved for the acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Customer,
    Staff,
    Admin,
}

impl ActorRole {
    fn parse(raw: &str) -> Self {
        match raw {
            "staff" | "pharmacist" => Self::Staff,
            "admin" => Self::Admin,
            _ => Self::Customer,
        }
    }

    /// Staff and admins may drive the prescription lifecycle.
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Staff | Self::Admin)
    }
}

/// The authenticated actor behind the current request.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub user_id: Uuid,
    pub role: ActorRole,
}

impl ActorContext {
    /// # Errors
    ///
    /// [`ApiError::Authorization`] when the actor is not staff or admin.
    pub fn require_staff(&self) -> Result<(), ApiError> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(ApiError::authorization(
                "This operation requires staff or admin privileges",
            ))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::authentication("Missing x-user-id header"))?;
        let user_id = Uuid::parse_str(user_id)
            .map_err(|_| ApiError::authentication("Invalid x-user-id header"))?;

        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|value| value.to_str().ok())
            .map(ActorRole::parse)
            .unwrap_or(ActorRole::Customer);

        Ok(Self { user_id, role })
    }
}
