use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{SaltString, rand_core::OsRng};
use uuid::Uuid;

use crate::error::{AppError, Result};

pub mod token;

pub use token::Claims;
use token::TokenSigner;

pub struct AuthService {
    signer: TokenSigner,
}

impl AuthService {
    pub fn new(secret: &str) -> Self {
        Self {
            signer: TokenSigner::new(secret),
        }
    }

    pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || -> Result<bool> {
            let parsed_hash = PasswordHash::new(&hash)
                .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

            let argon2 = Argon2::default();

            Ok(argon2.verify_password(password.as_bytes(), &parsed_hash).is_ok())
        })
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
    }

    pub async fn hash_password(password: &str) -> Result<String> {
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || -> Result<String> {
            let salt = SaltString::generate(&mut OsRng);
            let argon2 = Argon2::default();

            let password_hash = argon2
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

            Ok(password_hash.to_string())
        })
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String> {
        self.signer.sign(&Claims::new(user_id))
    }

    /// Returns the user id carried by a valid token.
    pub fn validate_token(&self, token: &str) -> Result<Uuid> {
        self.signer.verify(token).map(|claims| claims.user_id)
    }
}
