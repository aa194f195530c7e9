use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use uuid::Uuid;

use super::jwt::user_id_from_token;
use crate::{error::ApiError, state::AuthConfig};

/// Name of the private cookie that may carry the JWT
pub const AUTH_COOKIE: &str = "auth_token";

/// Authenticated user extractor
///
/// Reads the JWT from an `Authorization: Bearer` header, falling back to the
/// private `auth_token` cookie.
///
/// # Example
/// ```
/// use axum::extract::{Query, State};
/// use mnb_api::{ApiState, auth::AuthUser, error::ApiError, review::model::UserQuery};
///
/// async fn protected_route(
///     auth_user: AuthUser,
///     State(state): State<ApiState>,
///     Query(query): Query<UserQuery>,
/// ) -> Result<(), ApiError> {
///     auth_user.authorize(query.user_id)?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl AuthUser {
    /// Reject requests that act on behalf of another user.
    pub fn authorize(&self, user_id: Uuid) -> Result<(), ApiError> {
        if self.user_id == user_id {
            Ok(())
        } else {
            Err(ApiError::Auth(
                "userId does not match the authenticated user".to_string(),
            ))
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_owned())
}

impl<S> FromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    Key: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_config = AuthConfig::from_ref(state);

        let token = match bearer_token(parts) {
            Some(token) => token,
            None => {
                let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state)
                    .await
                    .map_err(|_| ApiError::Auth("Failed to read cookies".to_string()))?;

                jar.get(AUTH_COOKIE)
                    .ok_or_else(|| ApiError::Auth("Not authenticated".to_string()))?
                    .value()
                    .to_owned()
            }
        };

        let user_id = user_id_from_token(&token, &auth_config.jwt_secret)?;

        Ok(Self { user_id })
    }
}
