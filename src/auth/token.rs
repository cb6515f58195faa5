use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Session token claims. Tokens carry no expiry; `iat` records issuance only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: Uuid,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            iat: Utc::now().timestamp(),
        }
    }
}

pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected token: {}", e);
                AppError::InvalidToken
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_what_it_signs() {
        let signer = TokenSigner::new("test-secret");
        let claims = Claims::new(Uuid::new_v4());

        let token = signer.sign(&claims).unwrap();
        assert_eq!(signer.verify(&token).unwrap(), claims);
    }

    #[test]
    fn rejects_tokens_signed_with_another_secret() {
        let token = TokenSigner::new("one").sign(&Claims::new(Uuid::new_v4())).unwrap();
        let err = TokenSigner::new("two").verify(&token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn rejects_malformed_tokens() {
        let signer = TokenSigner::new("test-secret");
        assert!(matches!(signer.verify("not-a-jwt"), Err(AppError::InvalidToken)));
        assert!(matches!(signer.verify(""), Err(AppError::InvalidToken)));
    }

    #[test]
    fn rejects_wrong_claim_types() {
        #[derive(Serialize)]
        struct NumericClaims {
            user_id: i64,
            iat: i64,
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &NumericClaims { user_id: 42, iat: 0 },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let signer = TokenSigner::new("test-secret");
        assert!(matches!(signer.verify(&token), Err(AppError::InvalidToken)));
    }
}
