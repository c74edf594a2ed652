use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    Algorithm, DecodingKey, Validation, decode, decode_header, get_current_timestamp,
};
use serde::Deserialize;
use tracing::warn;

use feed_types::models::VerifiedIdentityClaim;

use crate::keys::KeySource;

/// Issuers Google signs ID tokens as.
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Why a credential was rejected. Callers only ever see "unauthorized"; the
/// variant is for the logs.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("no bearer credential presented")]
    CredentialMissing,

    #[error("malformed credential: {0}")]
    CredentialInvalid(String),

    #[error("credential expired")]
    CredentialExpired,

    #[error("audience mismatch")]
    AudienceMismatch,

    #[error("untrusted issuer")]
    IssuerMismatch,

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("unknown signing key: {0}")]
    UnknownKey(String),

    #[error("required claim missing: {0}")]
    ClaimMissing(&'static str),

    #[error("failed to fetch signing keys: {0}")]
    KeyFetch(String),
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => Self::CredentialExpired,
            ErrorKind::InvalidAudience => Self::AudienceMismatch,
            ErrorKind::InvalidIssuer => Self::IssuerMismatch,
            ErrorKind::InvalidSignature => Self::SignatureMismatch,
            _ => Self::CredentialInvalid(e.to_string()),
        }
    }
}

/// Claims we read from a verified ID token. `aud` and `iss` are checked by
/// `Validation`; `exp` is checked by both.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    exp: u64,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

/// Verifies identity-provider ID tokens against the provider's signing keys
/// and a single expected audience (our OAuth client id).
pub struct IdentityVerifier {
    audience: String,
    issuers: Vec<String>,
    keys: Arc<dyn KeySource>,
}

impl IdentityVerifier {
    pub fn new(audience: impl Into<String>, keys: Arc<dyn KeySource>) -> Self {
        Self {
            audience: audience.into(),
            issuers: GOOGLE_ISSUERS.iter().map(|s| s.to_string()).collect(),
            keys,
        }
    }

    pub fn with_issuers<I, S>(mut self, issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.issuers = issuers.into_iter().map(Into::into).collect();
        self
    }

    /// One verification attempt, no retries. A key fetch failure is a
    /// rejection like any other.
    pub async fn verify(&self, credential: &str) -> Result<VerifiedIdentityClaim, VerifyError> {
        let result = self.check(credential).await;
        if let Err(e) = &result {
            warn!(error = %e, "Rejected bearer credential");
        }
        result
    }

    async fn check(&self, credential: &str) -> Result<VerifiedIdentityClaim, VerifyError> {
        if credential.is_empty() {
            return Err(VerifyError::CredentialMissing);
        }

        let header = decode_header(credential)?;
        let kid = header
            .kid
            .ok_or_else(|| VerifyError::CredentialInvalid("token header has no kid".into()))?;

        let keys = self.keys.keys().await?;
        let jwk = keys
            .find(&kid)
            .ok_or_else(|| VerifyError::UnknownKey(kid.clone()))?;
        let key = DecodingKey::from_jwk(jwk)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(self.issuers.as_slice());
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);
        validation.leeway = 0;

        let claims = decode::<IdTokenClaims>(credential, &key, &validation)?.claims;

        // Validation only rejects `exp < now`; a token is dead at its expiry second.
        if claims.exp <= get_current_timestamp() {
            return Err(VerifyError::CredentialExpired);
        }

        // An empty username would break identity uniqueness, so email is required.
        let email = claims
            .email
            .filter(|e| !e.is_empty())
            .ok_or(VerifyError::ClaimMissing("email"))?;

        Ok(VerifiedIdentityClaim {
            name: claims.name.unwrap_or_default(),
            email,
            picture: claims.picture.unwrap_or_default(),
        })
    }
}
