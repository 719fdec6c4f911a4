use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use biodata_shared::errors::{AppError, AppResult, ErrorCode};
use biodata_shared::middleware::encode_access_token;
use biodata_shared::types::auth::{Claims, TokenPair};

use crate::config::AppConfig;
use crate::models::{NewRefreshToken, User};
use crate::store::Store;

pub fn create_access_token(user_id: Uuid, secret: &str, ttl_secs: i64) -> AppResult<String> {
    let claims = Claims::new(user_id, ttl_secs);
    encode_access_token(&claims, secret)
}

pub fn create_refresh_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn create_token_pair(user_id: Uuid, secret: &str, access_ttl: i64) -> AppResult<(TokenPair, String)> {
    let access_token = create_access_token(user_id, secret, access_ttl)?;
    let refresh_token = create_refresh_token();
    let refresh_hash = hash_token(&refresh_token);
    let pair = TokenPair::new(access_token, refresh_token, access_ttl);
    Ok((pair, refresh_hash))
}

/// Issues a token pair for `user` and stores the refresh token's hash.
pub fn issue_session(store: &dyn Store, config: &AppConfig, user: &User) -> AppResult<TokenPair> {
    let (pair, refresh_hash) = create_token_pair(user.id, &config.jwt_secret, config.jwt_access_ttl)?;

    store.insert_refresh_token(NewRefreshToken {
        user_id: user.id,
        token_hash: refresh_hash,
        expires_at: Utc::now() + Duration::seconds(config.jwt_refresh_ttl),
    })?;

    Ok(pair)
}

/// Trades a live refresh token for a new pair. The presented token is revoked
/// first, so it can be used exactly once.
pub fn rotate_session(store: &dyn Store, config: &AppConfig, refresh_token: &str) -> AppResult<(User, TokenPair)> {
    let invalid = || AppError::new(ErrorCode::RefreshTokenRevoked, "Invalid or expired refresh token");

    let stored = store
        .find_refresh_token(&hash_token(refresh_token))?
        .ok_or_else(invalid)?;

    let now = Utc::now();
    if !stored.is_usable(now) {
        return Err(invalid());
    }
    if !store.revoke_refresh_token(stored.id, now)? {
        return Err(invalid());
    }

    let user = store
        .find_user(stored.user_id)?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "User profile not found"))?;

    let pair = issue_session(store, config, &user)?;
    tracing::info!(user_id = %user.id, "session refreshed");

    Ok((user, pair))
}

#[cfg(test)]
mod tests {
    use super::*;
    use biodata_shared::middleware::decode_access_token;

    #[test]
    fn token_hash_is_stable_hex_sha256() {
        let hash = hash_token("abc");
        assert_eq!(hash, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_eq!(hash, hash_token("abc"));
    }

    #[test]
    fn refresh_tokens_are_random_hex() {
        let a = create_refresh_token();
        let b = create_refresh_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn pair_carries_hash_of_its_refresh_token() {
        let user_id = Uuid::now_v7();
        let (pair, hash) = create_token_pair(user_id, "secret", 900).unwrap();
        assert_eq!(hash, hash_token(&pair.refresh_token));
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 900);
        assert_eq!(decode_access_token(&pair.access_token, "secret").unwrap().sub, user_id);
    }
}
