// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Signed credential encoding and verification.
//!
//! A [`TokenCodec`] is bound to one credential class: one secret, one HMAC
//! algorithm, one validity window. Access and refresh credentials use two
//! separate codecs so that a leaked refresh secret cannot forge access
//! credentials and vice versa.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, warn};
use warden_config::{CredentialSettings, SigningAlgorithm};
use warden_core::{CredentialError, TokenId, TokenKind, UserId, WardenError, WardenResult};

use crate::claims::Claims;

/// Token identifier length in bytes before encoding.
pub const TOKEN_ID_BYTES: usize = 32;

/// Recommended minimum secret length in bytes.
const MIN_SECRET_LEN: usize = 32;

// =============================================================================
// CodecConfig
// =============================================================================

/// Configuration for one credential class.
#[derive(Clone)]
pub struct CodecConfig {
    /// Credential class this codec signs.
    pub kind: TokenKind,
    /// HMAC secret.
    pub secret: String,
    /// Issuer tag written into and required of every credential.
    pub issuer: String,
    /// Validity window.
    pub window: Duration,
    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,
}

impl CodecConfig {
    /// Creates a configuration with the default issuer and algorithm.
    pub fn new(kind: TokenKind, secret: impl Into<String>, window: Duration) -> Self {
        Self {
            kind,
            secret: secret.into(),
            issuer: "warden".to_string(),
            window,
            algorithm: SigningAlgorithm::default(),
        }
    }

    /// Builds a configuration from loaded credential settings.
    pub fn from_settings(kind: TokenKind, settings: &CredentialSettings, issuer: &str) -> Self {
        Self {
            kind,
            secret: settings.secret.clone(),
            issuer: issuer.to_string(),
            window: settings.ttl,
            algorithm: settings.algorithm,
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets the algorithm.
    pub fn with_algorithm(mut self, algorithm: SigningAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    fn validate(&self) -> WardenResult<()> {
        if self.secret.is_empty() {
            return Err(WardenError::config(format!(
                "{} credential secret is not configured",
                self.kind
            )));
        }
        if self.window.is_zero() {
            return Err(WardenError::config(format!(
                "{} credential window must be positive",
                self.kind
            )));
        }
        if self.secret.len() < MIN_SECRET_LEN {
            warn!(
                kind = %self.kind,
                "Credential secret is shorter than recommended ({} bytes)",
                MIN_SECRET_LEN
            );
        }
        Ok(())
    }
}

impl std::fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecConfig")
            .field("kind", &self.kind)
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("window", &self.window)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

// =============================================================================
// IssuedCredential
// =============================================================================

/// A freshly signed credential together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    /// The encoded credential string.
    pub token: String,
    /// The claims signed into it.
    pub claims: Claims,
}

// =============================================================================
// TokenCodec
// =============================================================================

/// Encoder and verifier for one credential class.
#[derive(Clone)]
pub struct TokenCodec {
    config: Arc<CodecConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenCodec {
    /// Creates a codec. Fails if the secret is empty or the window is zero.
    pub fn new(config: CodecConfig) -> WardenResult<Self> {
        config.validate()?;

        let algorithm = jwt_algorithm(config.algorithm);
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_aud = false;
        validation.leeway = 0;

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    /// Returns the credential class.
    pub fn kind(&self) -> TokenKind {
        self.config.kind
    }

    /// Returns the configured validity window.
    pub fn window(&self) -> Duration {
        self.config.window
    }

    /// Returns the issuer tag.
    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }

    /// Issues a credential for `subject` using the configured window.
    pub fn issue(&self, subject: UserId, name: &str) -> WardenResult<IssuedCredential> {
        self.issue_with_window(subject, name, self.config.window)
    }

    /// Issues a credential for `subject` with an explicit window.
    pub fn issue_with_window(
        &self,
        subject: UserId,
        name: &str,
        window: Duration,
    ) -> WardenResult<IssuedCredential> {
        let claims = Claims::new(subject, name, generate_token_id(), &self.config.issuer, window);
        let token = self.sign(&claims)?;
        Ok(IssuedCredential { token, claims })
    }

    /// Signs arbitrary claims with this codec's secret.
    pub fn sign(&self, claims: &Claims) -> WardenResult<String> {
        let header = Header::new(jwt_algorithm(self.config.algorithm));

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| WardenError::internal(format!("Failed to sign credential: {}", e)))
    }

    /// Verifies signature, issuer and expiry, and returns the claims.
    ///
    /// Expiry is judged against this process's wall clock with no leeway.
    pub fn verify(&self, token: &str) -> Result<Claims, CredentialError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let err = match e.kind() {
                    ErrorKind::ExpiredSignature => CredentialError::Expired,
                    ErrorKind::InvalidSignature => CredentialError::malformed("signature mismatch"),
                    ErrorKind::InvalidAlgorithm => CredentialError::malformed("unexpected algorithm"),
                    ErrorKind::InvalidIssuer => CredentialError::malformed("unexpected issuer"),
                    ErrorKind::MissingRequiredClaim(claim) => {
                        CredentialError::malformed(format!("missing claim: {}", claim))
                    }
                    _ => CredentialError::malformed(e.to_string()),
                };
                debug!(kind = %self.config.kind, error = %err, "Credential rejected");
                err
            })
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("kind", &self.config.kind)
            .field("issuer", &self.config.issuer)
            .field("algorithm", &self.config.algorithm)
            .field("window", &self.config.window)
            .finish()
    }
}

/// Generates a fresh 256-bit token identifier from the OS RNG.
pub fn generate_token_id() -> TokenId {
    let mut bytes = [0u8; TOKEN_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    TokenId::new(URL_SAFE_NO_PAD.encode(bytes))
}

fn jwt_algorithm(algorithm: SigningAlgorithm) -> Algorithm {
    match algorithm {
        SigningAlgorithm::HS256 => Algorithm::HS256,
        SigningAlgorithm::HS384 => Algorithm::HS384,
        SigningAlgorithm::HS512 => Algorithm::HS512,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(CodecConfig::new(
            TokenKind::Access,
            secret,
            Duration::from_secs(900),
        ))
        .unwrap()
    }

    fn test_codec() -> TokenCodec {
        codec("test-secret-key-that-is-long-enough-for-testing")
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = test_codec();
        let issued = codec.issue(UserId::new(42), "alice").unwrap();

        let claims = codec.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, UserId::new(42));
        assert_eq!(claims.name, "alice");
        assert_eq!(claims.iss, "warden");
        assert_eq!(claims, issued.claims);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_token_is_url_safe() {
        let issued = test_codec().issue(UserId::new(1), "u").unwrap();
        assert!(issued
            .token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')));
    }

    #[test]
    fn test_expired_credential() {
        let codec = test_codec();
        let mut claims = Claims::new(
            UserId::new(1),
            "u",
            generate_token_id(),
            "warden",
            Duration::from_secs(60),
        );
        claims.exp = claims.iat - 3600;
        let token = codec.sign(&claims).unwrap();

        assert_eq!(codec.verify(&token), Err(CredentialError::Expired));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let err = test_codec().verify("invalid.token.here").unwrap_err();
        assert!(matches!(err, CredentialError::Malformed { .. }));

        let err = test_codec().verify("").unwrap_err();
        assert!(matches!(err, CredentialError::Malformed { .. }));
    }

    #[test]
    fn test_wrong_secret_is_malformed() {
        let a = codec("secret-one-for-testing-purposes!!");
        let b = codec("secret-two-for-testing-purposes!!");

        let issued = a.issue(UserId::new(1), "u").unwrap();
        let err = b.verify(&issued.token).unwrap_err();
        assert_eq!(err, CredentialError::malformed("signature mismatch"));
    }

    #[test]
    fn test_expired_with_wrong_secret_is_malformed() {
        let a = codec("secret-one-for-testing-purposes!!");
        let b = codec("secret-two-for-testing-purposes!!");

        let mut claims = a.issue(UserId::new(1), "u").unwrap().claims;
        claims.exp = claims.iat - 3600;
        let token = a.sign(&claims).unwrap();

        assert!(matches!(
            b.verify(&token),
            Err(CredentialError::Malformed { .. })
        ));
    }

    #[test]
    fn test_tampered_payload_is_malformed() {
        let codec = test_codec();
        let issued = codec.issue(UserId::new(1), "u").unwrap();

        let mut parts: Vec<&str> = issued.token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&Claims {
                sub: UserId::new(2),
                ..issued.claims.clone()
            })
            .unwrap(),
        );
        parts[1] = forged.as_str();

        let err = codec.verify(&parts.join(".")).unwrap_err();
        assert!(matches!(err, CredentialError::Malformed { .. }));
    }

    #[test]
    fn test_issuer_mismatch_is_malformed() {
        let secret = "shared-secret-for-issuer-mismatch-test";
        let a = TokenCodec::new(
            CodecConfig::new(TokenKind::Access, secret, Duration::from_secs(60)).with_issuer("a"),
        )
        .unwrap();
        let b = TokenCodec::new(
            CodecConfig::new(TokenKind::Access, secret, Duration::from_secs(60)).with_issuer("b"),
        )
        .unwrap();

        let issued = a.issue(UserId::new(1), "u").unwrap();
        assert_eq!(
            b.verify(&issued.token),
            Err(CredentialError::malformed("unexpected issuer"))
        );
    }

    #[test]
    fn test_algorithm_mismatch_is_malformed() {
        let secret = "shared-secret-for-algorithm-mismatch";
        let a = TokenCodec::new(
            CodecConfig::new(TokenKind::Access, secret, Duration::from_secs(60))
                .with_algorithm(SigningAlgorithm::HS512),
        )
        .unwrap();
        let b = codec(secret);

        let issued = a.issue(UserId::new(1), "u").unwrap();
        assert!(a.verify(&issued.token).is_ok());
        assert!(matches!(
            b.verify(&issued.token),
            Err(CredentialError::Malformed { .. })
        ));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = TokenCodec::new(CodecConfig::new(
            TokenKind::Refresh,
            "",
            Duration::from_secs(60),
        ));
        assert!(matches!(result, Err(WardenError::Config { .. })));
    }

    #[test]
    fn test_token_ids_unique() {
        let ids: HashSet<TokenId> = (0..1000).map(|_| generate_token_id()).collect();
        assert_eq!(ids.len(), 1000);
        // 32 bytes -> 43 base64url characters without padding.
        assert!(ids.iter().all(|id| id.as_str().len() == 43));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = CodecConfig::new(TokenKind::Access, "super-secret", Duration::from_secs(1));
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
