//! Minimal signup/login provider backed by argon2 password hashes.

use std::time::SystemTime;

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use tokio::task;
use tracing::{info, warn};

use crate::{
    dao::{models::UserEntity, storage::StorageError},
    dto::auth::AuthRequest,
    error::ServiceError,
    services::provisioner,
    state::{SharedState, session::Session},
};

/// Result of a successful `/auth` call.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    /// Freshly issued session.
    pub session: Session,
    /// True when the account was created by this call.
    pub created: bool,
}

/// Sign a new user up or log an existing one in, making sure they end up with a board.
///
/// New accounts get a freshly provisioned board; returning users keep theirs
/// (or get one if they never had any).
pub async fn authenticate(
    state: &SharedState,
    request: AuthRequest,
) -> Result<AuthOutcome, ServiceError> {
    let store = state.require_board_store().await?;
    let AuthRequest { username, password } = request;

    let created = match store.find_user(username.clone()).await? {
        Some(user) => {
            if !verify_password(password, user.password_hash).await? {
                warn!(username = %username, "rejected login with wrong password");
                return Err(ServiceError::Unauthorized("invalid credentials".into()));
            }
            provisioner::ensure(state, &username).await?;
            false
        }
        None => {
            let password_hash = hash_password(password).await?;
            let user = UserEntity {
                username: username.clone(),
                password_hash,
                created_at: SystemTime::now(),
            };
            match store.create_user(user).await {
                Ok(()) => {}
                Err(StorageError::Constraint { .. }) => {
                    return Err(ServiceError::Unauthorized("username already taken".into()));
                }
                Err(err) => return Err(err.into()),
            }
            provisioner::provision(state, &username).await?;
            info!(username = %username, "user signed up");
            true
        }
    };

    let session = state.sessions().issue(&username);
    Ok(AuthOutcome { session, created })
}

async fn hash_password(password: String) -> Result<String, ServiceError> {
    task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| ServiceError::Internal(format!("cannot hash password: {err}")))
    })
    .await
    .map_err(|err| ServiceError::Internal(format!("password hashing aborted: {err}")))?
}

async fn verify_password(password: String, hash: String) -> Result<bool, ServiceError> {
    task::spawn_blocking(move || {
        let parsed = match PasswordHash::new(&hash) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "stored password hash is malformed");
                return false;
            }
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
    .await
    .map_err(|err| ServiceError::Internal(format!("password check aborted: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hashes_verify_only_the_original_password() {
        let hash = hash_password("hunter2".into()).await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("hunter3".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_never_verifies() {
        assert!(!verify_password("x".into(), "not-a-hash".into()).await.unwrap());
    }
}
