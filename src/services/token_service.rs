//! Compact HS256 bearer tokens.
//!
//! `base64url(header) "." base64url(payload) "." base64url(HMAC-SHA256(header "." payload))`,
//! unpadded. The header is always `{"alg":"HS256","typ":"JWT"}` and the payload keys are
//! emitted in the order `sub, iss, iat, exp, email, role`, so tokens are reproducible byte for
//! byte and readable by any standard JWT verifier.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

pub const ROLE_AUTHENTICATED: &str = "authenticated";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Serialize)]
struct Payload<'a> {
    sub: &'a str,
    iss: &'a str,
    iat: i64,
    exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
}

/// Verified payload of a token.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims(Map<String, JsonValue>);

impl Claims {
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(JsonValue::as_str)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get_str("sub")
    }

    pub fn email(&self) -> Option<&str> {
        self.get_str("email")
    }

    pub fn role(&self) -> Option<&str> {
        self.get_str("role")
    }

    pub fn issuer(&self) -> Option<&str> {
        self.get_str("iss")
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.0.get("exp").and_then(JsonValue::as_i64)
    }
}

#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
    app_issuer: String,
    app_ttl_seconds: i64,
    admin_issuer: String,
    admin_ttl_seconds: i64,
}

impl TokenService {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            app_issuer: "app".to_string(),
            app_ttl_seconds: 3600,
            admin_issuer: "app-admin".to_string(),
            admin_ttl_seconds: 7200,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            secret: config.jwt_secret.as_bytes().to_vec(),
            app_issuer: config.app_token_issuer.clone(),
            app_ttl_seconds: config.app_token_ttl_seconds,
            admin_issuer: config.admin_token_issuer.clone(),
            admin_ttl_seconds: config.admin_token_ttl_seconds,
        }
    }

    pub fn app_ttl_seconds(&self) -> i64 {
        self.app_ttl_seconds
    }

    pub fn admin_ttl_seconds(&self) -> i64 {
        self.admin_ttl_seconds
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::Internal(format!("Invalid signing key: {}", e)))
    }

    fn sign(&self, signing_input: &str) -> Result<Vec<u8>> {
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }

    pub fn mint(
        &self,
        subject: &str,
        email: Option<&str>,
        role: Option<&str>,
        issuer: &str,
        ttl_seconds: i64,
    ) -> Result<String> {
        let iat = crate::utils::time::now().timestamp();
        self.mint_at(subject, email, role, issuer, ttl_seconds, iat)
    }

    pub fn mint_at(
        &self,
        subject: &str,
        email: Option<&str>,
        role: Option<&str>,
        issuer: &str,
        ttl_seconds: i64,
        issued_at: i64,
    ) -> Result<String> {
        let payload = Payload {
            sub: subject,
            iss: issuer,
            iat: issued_at,
            exp: issued_at + ttl_seconds,
            email,
            role,
        };
        let header = URL_SAFE_NO_PAD.encode(HEADER);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload)?);
        let signing_input = format!("{}.{}", header, payload);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(&signing_input)?);
        Ok(format!("{}.{}", signing_input, signature))
    }

    /// One-hour token asserting an authenticated end user.
    pub fn mint_app_token(&self, subject: &str, email: Option<&str>) -> Result<String> {
        self.mint(
            subject,
            email,
            Some(ROLE_AUTHENTICATED),
            &self.app_issuer,
            self.app_ttl_seconds,
        )
    }

    /// Two-hour administrator token. Callers must have confirmed admin status first.
    pub fn mint_admin_token(&self, subject: &str, email: Option<&str>) -> Result<String> {
        self.mint(
            subject,
            email,
            Some(ROLE_ADMIN),
            &self.admin_issuer,
            self.admin_ttl_seconds,
        )
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, crate::utils::time::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims> {
        let parts: Vec<&str> = token.split('.').collect();
        let [header, payload, signature] = parts.as_slice() else {
            return Err(Error::InvalidToken);
        };

        // Recompute over the literal segments, never over re-serialized claims.
        let expected = self.sign(&format!("{}.{}", header, payload))?;
        let provided = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| Error::InvalidToken)?;
        if !bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
            return Err(Error::InvalidToken);
        }

        let raw = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| Error::InvalidToken)?;
        let claims: Map<String, JsonValue> =
            serde_json::from_slice(&raw).map_err(|_| Error::InvalidToken)?;
        let claims = Claims(claims);

        if let Some(exp) = claims.expires_at() {
            if now > exp {
                return Err(Error::Expired);
            }
        }
        Ok(claims)
    }
}
