use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

crate::text_enum! {
    pub enum UserRole {
        Admin => "ADMIN",
        ParentRelative => "PARENT_RELATIVE",
        Candidate => "CANDIDATE",
    }
}

/// Access token claims. The role is not carried; it is read from the
/// user row on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn new(user_id: Uuid, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id,
            iat: now,
            exp: now + duration_secs,
            jti: Uuid::now_v7(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenPair {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_use_screaming_case() {
        assert_eq!("PARENT_RELATIVE".parse::<UserRole>(), Ok(UserRole::ParentRelative));
        assert_eq!(serde_json::to_value(UserRole::Admin).unwrap(), serde_json::json!("ADMIN"));
    }

    #[test]
    fn fresh_claims_are_not_expired() {
        let claims = Claims::new(Uuid::now_v7(), 60);
        assert!(!claims.is_expired());
        assert!(Claims::new(Uuid::now_v7(), -60).is_expired());
    }
}
