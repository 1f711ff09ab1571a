use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::Error as JsonWebTokenError;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::errors::JwtError;

const REQUIRED_CLAIMS: [&str; 4] = ["sub", "exp", "iat", "iss"];

/// JWT token handler for encoding and decoding tokens.
///
/// Signs with HS256 and accepts nothing else on decode: a token whose header
/// names another algorithm is rejected before its signature is looked at.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    issuer: Option<String>,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Symmetric signing secret
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Load it from configuration, never from code
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            issuer: None,
        }
    }

    /// Require decoded tokens to carry this `iss` value.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Encode claims into a signed JWT.
    ///
    /// # Errors
    /// * `EncodingFailed` - Claims could not be serialized or signed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a JWT.
    ///
    /// Checks algorithm pinning, then the signature, then expiry with zero
    /// leeway and the issuer when one is configured. Every one of
    /// `sub`/`exp`/`iat`/`iss` must be present; an absent one is reported
    /// as `MissingClaim` before the claims are read into `T`.
    ///
    /// # Errors
    /// * `UnexpectedAlgorithm` - Header algorithm is not HS256
    /// * `InvalidSignature` - Signature does not match the secret
    /// * `MissingClaim` - A mandatory claim is absent
    /// * `TokenExpired` - `exp` is in the past
    /// * `InvalidToken` - Malformed token, wrong issuer or undecodable claims
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&REQUIRED_CLAIMS);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        // Decoded untyped first so an absent claim is reported as such
        // rather than as a deserialization failure of `T`.
        let claims = decode::<Value>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(classify)?;

        // jsonwebtoken does not enforce `iat`
        if let Some(missing) = REQUIRED_CLAIMS
            .iter()
            .find(|claim| claims.get(**claim).map_or(true, Value::is_null))
        {
            return Err(JwtError::MissingClaim(missing.to_string()));
        }

        serde_json::from_value(claims).map_err(|e| JwtError::InvalidToken(e.to_string()))
    }
}

fn classify(error: JsonWebTokenError) -> JwtError {
    match error.kind() {
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        ErrorKind::InvalidAlgorithm => JwtError::UnexpectedAlgorithm,
        ErrorKind::MissingRequiredClaim(claim) => JwtError::MissingClaim(claim.clone()),
        ErrorKind::InvalidIssuer => JwtError::InvalidToken("unexpected issuer".to_string()),
        _ => JwtError::InvalidToken(error.to_string()),
    }
}
