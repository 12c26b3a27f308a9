//! Authentication service: password hashing, JWT issuance, login, and user
//! management. Session handling beyond a bearer token is out of scope; the
//! core only needs an authenticated actor identity and role per request.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{CreateUser, User};

/// JWT claims embedded in access tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub user_id: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token returned on successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Hash a plaintext password with argon2id.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Issue an access token for an authenticated user.
pub fn issue_token(
    user: &User,
    jwt_secret: &str,
    expiry_secs: i64,
) -> Result<TokenResponse, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.username.clone(),
        user_id: user.id.to_string(),
        role: serde_json::to_string(&user.role)
            .unwrap_or_default()
            .trim_matches('"')
            .to_string(),
        exp: (now + Duration::seconds(expiry_secs)).timestamp(),
        iat: now.timestamp(),
    };

    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))?;

    Ok(TokenResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: expiry_secs,
    })
}

/// Validate a JWT and return the claims.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<Claims, AppError> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

/// Create a new user with a hashed password.
pub async fn create_user(pool: &PgPool, input: &CreateUser) -> Result<User, AppError> {
    let password_hash = hash_password(&input.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password_hash, display_name, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(&input.username)
    .bind(&input.email)
    .bind(&password_hash)
    .bind(&input.display_name)
    .bind(input.role)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("Username or email already exists".to_string())
        }
        _ => AppError::Database(e),
    })?;

    Ok(user)
}

/// Authenticate by username and password, returning an access token.
pub async fn login(
    pool: &PgPool,
    username: &str,
    password: &str,
    jwt_secret: &str,
    expiry_secs: i64,
) -> Result<TokenResponse, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !user.is_active || !verify_password(password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    issue_token(&user, jwt_secret, expiry_secs)
}

pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    fn test_user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            username: "checker1".to_string(),
            email: "checker1@smsledger.local".to_string(),
            password_hash: String::new(),
            display_name: "Checker One".to_string(),
            role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(verify_password("s3cret!", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn token_round_trip_preserves_identity_and_role() {
        let user = test_user(UserRole::Checker);
        let token = issue_token(&user, "test-secret", 3600).unwrap();
        let claims = validate_token(&token.access_token, "test-secret").unwrap();
        assert_eq!(claims.sub, "checker1");
        assert_eq!(claims.role, "CHECKER");
        assert_eq!(claims.user_id, user.id.to_string());
    }

    #[test]
    fn token_rejects_wrong_secret() {
        let user = test_user(UserRole::Maker);
        let token = issue_token(&user, "secret-a", 3600).unwrap();
        assert!(matches!(
            validate_token(&token.access_token, "secret-b"),
            Err(AppError::Unauthorized)
        ));
    }
}
