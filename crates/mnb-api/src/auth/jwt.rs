use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id as string
    pub exp: usize,
    pub iat: usize,
}

/// Generate a JWT for a user.
///
/// Tokens are normally issued by the account service; this is used by tooling
/// and tests that need to act as a given user.
pub fn generate_jwt_token(
    user_id: Uuid,
    jwt_secret: &str,
    expiry_hours: i64,
) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + chrono::Duration::hours(expiry_hours)).timestamp() as usize,
    };

    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a JWT
pub fn verify_jwt_token(token: &str, jwt_secret: &str) -> Result<Claims, ApiError> {
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Auth("Invalid or expired token".to_string()))?;

    Ok(token_data.claims)
}

/// Decode a token and return the user it was issued for
pub fn user_id_from_token(token: &str, jwt_secret: &str) -> Result<Uuid, ApiError> {
    let claims = verify_jwt_token(token, jwt_secret)?;

    Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::Auth("Invalid user ID in token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_jwt_secret_minimum_32_characters_long";

    #[test]
    fn test_generate_and_verify_jwt_token() {
        let user_id = Uuid::new_v4();

        let token = generate_jwt_token(user_id, SECRET, 24).expect("Failed to generate token");
        assert!(!token.is_empty(), "Token should not be empty");

        let claims = verify_jwt_token(&token, SECRET).expect("Failed to verify token");
        assert_eq!(claims.sub, user_id.to_string());
        assert!(
            claims.exp > claims.iat,
            "Expiration should be after issued at"
        );
        assert_eq!(user_id_from_token(&token, SECRET).unwrap(), user_id);
    }

    #[test]
    fn test_verify_jwt_token_with_wrong_secret() {
        let token = generate_jwt_token(Uuid::new_v4(), SECRET, 24).unwrap();

        let result = verify_jwt_token(&token, "wrong_jwt_secret_minimum_32_characters_long");

        match result {
            Err(ApiError::Auth(msg)) => assert!(msg.contains("Invalid or expired token")),
            other => panic!("Expected Auth error, got {other:?}"),
        }
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Past the default 60s leeway
        let token = generate_jwt_token(Uuid::new_v4(), SECRET, -1).unwrap();

        assert!(matches!(
            verify_jwt_token(&token, SECRET),
            Err(ApiError::Auth(_))
        ));
    }

    #[test]
    fn test_non_uuid_subject_is_rejected() {
        let now = Utc::now();
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            iat: now.timestamp() as usize,
            exp: (now + chrono::Duration::hours(1)).timestamp() as usize,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        match user_id_from_token(&token, SECRET) {
            Err(ApiError::Auth(msg)) => assert!(msg.contains("Invalid user ID")),
            other => panic!("Expected Auth error, got {other:?}"),
        }
    }
}
