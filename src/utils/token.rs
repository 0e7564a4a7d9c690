use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Issue a signed access token for a user. The role claim drives the admin
/// middleware; the subject is the user id.
pub fn create_access_token(user_id: i64, role: &str) -> Result<String> {
    let config = crate::config::get_config();
    let expires_at = Utc::now() + Duration::hours(config.token_expiry_hours);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expires_at.timestamp() as usize,
        role: Some(role.to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
}

/// Random key naming an export artifact on disk.
pub fn generate_file_key(prefix: &str) -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    format!(
        "{}_{}_{}",
        prefix,
        Utc::now().format("%Y%m%d%H%M%S"),
        suffix
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    fn ensure_config() {
        std::env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
        std::env::set_var("DATABASE_URL", "postgres://localhost/quiz_master_test");
        std::env::set_var("JWT_SECRET", "token-test-secret");
        std::env::set_var("TOKEN_EXPIRY_HOURS", "24");
        std::env::set_var("ADMIN_USERNAME", "admin");
        std::env::set_var("ADMIN_PASSWORD", "admin123");
        std::env::set_var("EXPORT_DIR", "/tmp/quiz-master-exports");
        let _ = crate::config::init_config();
    }

    #[test]
    fn issued_token_decodes_with_expected_claims() {
        ensure_config();
        let token = create_access_token(42, "admin").expect("token");
        let secret = crate::config::get_config().jwt_secret.as_bytes();
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(secret),
            &Validation::default(),
        )
        .expect("decode");
        assert_eq!(data.claims.sub, "42");
        assert_eq!(data.claims.role.as_deref(), Some("admin"));
    }

    #[test]
    fn file_keys_are_unique_and_prefixed() {
        let a = generate_file_key("user_scores_7");
        let b = generate_file_key("user_scores_7");
        assert!(a.starts_with("user_scores_7_"));
        assert_ne!(a, b);
    }
}
