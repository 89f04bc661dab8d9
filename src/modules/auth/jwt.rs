use anyhow::Context;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The provider identity established by a verified bearer token, lives for
/// one request as a request extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthInfo {
    pub provider_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    // Issued at (as UTC timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,

    // Expiration time (as UTC timestamp), optional: tokens without it do not expire
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,

    // Subject (whom token refers to)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    // Provider the token holder acts as
    pub provider_id: Uuid,
}

impl Claims {
    pub fn for_provider(provider_id: Uuid) -> Claims {
        Claims {
            iat: Some(Utc::now().timestamp() as u64),
            exp: None,
            sub: None,
            provider_id,
        }
    }

    /// sets the claims `iat` (issued at) to the current time, and the `exp` to now + duration
    pub fn set_expiration_in(&mut self, duration: Duration) -> &Self {
        let now = Utc::now();

        self.exp = Some((now + duration).timestamp() as u64);
        self.iat = Some(now.timestamp() as u64);

        self
    }
}

/// the only signature algorithms trusted for bearer tokens, everything
/// else (including the unsigned "none" algorithm) is rejected
const ALLOWED_ALGORITHMS: [Algorithm; 3] = [Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

/// Verifies a bearer token against the configured RSA public key and
/// extracts the provider identity from its claims
pub fn verify(
    token: &str,
    public_key: &DecodingKey,
) -> Result<AuthInfo, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.algorithms = ALLOWED_ALGORITHMS.to_vec();
    // `exp` is honored when present but tokens are not required to carry it
    validation.required_spec_claims.clear();

    let token_data = jsonwebtoken::decode::<Claims>(token, public_key, &validation)?;

    Ok(AuthInfo {
        provider_id: token_data.claims.provider_id,
    })
}

/// Reads the RSA public key used to verify bearer tokens, called once at
/// process start
pub fn load_public_key(path: &str) -> anyhow::Result<DecodingKey> {
    let pem = std::fs::read(path)
        .with_context(|| format!("failed to read JWT public key at {path}"))?;

    DecodingKey::from_rsa_pem(&pem).context("JWT public key is not a valid RSA PEM")
}
