use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Settings;
use crate::error::{AppError, AuthError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

/// Issues and verifies HMAC-signed tokens under the application secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Option<Duration>,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Option<Duration>) -> Result<Self, AppError> {
        if secret.is_empty() {
            return Err(AppError::ConfigError("app_secret is not set".into()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Only the HMAC family is accepted; "none" never parses and asymmetric algorithms
        // are rejected before the signature is checked.
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // Long-lived tokens without `exp` are valid; `exp` and `nbf` are enforced when present.
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        Self::new(&settings.app_secret, settings.token_ttl())
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn issue(&self, user: &str) -> Result<String, AppError> {
        if user.is_empty() {
            return Err(AppError::ValidationError("user name must not be empty".into()));
        }

        let now = Utc::now();
        let claims = TokenClaims {
            user: user.to_string(),
            exp: self.ttl.map(|ttl| (now + ttl).timestamp()),
            iat: Some(now.timestamp()),
            nbf: None,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::InternalError(format!("failed to sign token: {}", e)))
    }

    /// Checks signature, algorithm and time claims, then the claim shape.
    ///
    /// A correctly signed token whose claims lack a string `user` (missing, or of another
    /// JSON type) fails with [`AuthError::TokenClaimsInvalid`], answered as "Invalid tokens".
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<Map<String, Value>>(token, &self.decoding, &self.validation)
            .map_err(|e| classify(e.kind()))?;

        serde_json::from_value(Value::Object(data.claims)).map_err(|_| AuthError::TokenClaimsInvalid)
    }
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::InvalidAlgorithmName => AuthError::TokenMalformed,
        ErrorKind::InvalidSignature => AuthError::TokenSignatureInvalid,
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
        _ => AuthError::TokenRejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use serde_json::json;

    const SECRET: &str = "test_secret";

    fn service() -> TokenService {
        TokenService::new(SECRET, None).unwrap()
    }

    fn sign_with<T: Serialize>(alg: Algorithm, secret: &str, claims: &T) -> String {
        encode(&Header::new(alg), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    /// Builds `header.payload.signature` by hand, for headers jsonwebtoken refuses to emit.
    fn raw_token(header: Value, claims: Value, signature: &str) -> String {
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(claims.to_string()),
            signature
        )
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service();
        let token = tokens.issue("alice").unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.user, "alice");
        assert!(claims.exp.is_none());
        assert!(claims.iat.is_some());
    }

    #[test]
    fn test_issue_with_ttl_sets_expiry() {
        let tokens = service().with_ttl(Some(Duration::hours(2)));
        let claims = tokens.verify(&tokens.issue("alice").unwrap()).unwrap();

        let exp = claims.exp.expect("ttl sets exp");
        let iat = claims.iat.unwrap();
        assert_eq!(exp - iat, 2 * 3600);
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(matches!(TokenService::new("", None), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_empty_user_is_rejected() {
        assert!(matches!(service().issue(""), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_wrong_secret() {
        let token = TokenService::new("other_secret", None).unwrap().issue("alice").unwrap();
        assert_eq!(service().verify(&token), Err(AuthError::TokenSignatureInvalid));
    }

    #[test]
    fn test_garbage_token() {
        assert_eq!(service().verify("not-a-token"), Err(AuthError::TokenMalformed));
        assert_eq!(service().verify(""), Err(AuthError::TokenMalformed));
    }

    #[test]
    fn test_alg_none_is_rejected() {
        let token = raw_token(json!({ "alg": "none", "typ": "JWT" }), json!({ "user": "alice" }), "");
        assert_eq!(service().verify(&token), Err(AuthError::TokenMalformed));
    }

    #[test]
    fn test_asymmetric_alg_is_rejected() {
        // HMAC signature smuggled under an RS256 header
        let signed = sign_with(Algorithm::HS256, SECRET, &json!({ "user": "alice" }));
        let signature = signed.rsplit('.').next().unwrap();
        let token = raw_token(json!({ "alg": "RS256", "typ": "JWT" }), json!({ "user": "alice" }), signature);

        assert_eq!(service().verify(&token), Err(AuthError::TokenRejected));
    }

    #[test]
    fn test_other_hmac_algorithms_are_accepted() {
        for alg in [Algorithm::HS384, Algorithm::HS512] {
            let token = sign_with(alg, SECRET, &json!({ "user": "alice" }));
            assert_eq!(service().verify(&token).unwrap().user, "alice");
        }
    }

    #[test]
    fn test_expired_token() {
        let claims = TokenClaims {
            user: "alice".into(),
            exp: Some((Utc::now() - Duration::hours(1)).timestamp()),
            iat: None,
            nbf: None,
        };
        let token = sign_with(Algorithm::HS256, SECRET, &claims);
        assert_eq!(service().verify(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn test_recently_expired_token() {
        let claims = TokenClaims {
            user: "alice".into(),
            exp: Some((Utc::now() - Duration::seconds(30)).timestamp()),
            iat: None,
            nbf: None,
        };
        let token = sign_with(Algorithm::HS256, SECRET, &claims);
        assert_eq!(service().verify(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn test_nbf_applies_without_slack() {
        let claims = TokenClaims {
            user: "alice".into(),
            exp: None,
            iat: None,
            nbf: Some((Utc::now() + Duration::seconds(30)).timestamp()),
        };
        let token = sign_with(Algorithm::HS256, SECRET, &claims);
        assert_eq!(service().verify(&token), Err(AuthError::TokenNotYetValid));
    }

    #[test]
    fn test_not_yet_valid_token() {
        let claims = TokenClaims {
            user: "alice".into(),
            exp: None,
            iat: None,
            nbf: Some((Utc::now() + Duration::hours(1)).timestamp()),
        };
        let token = sign_with(Algorithm::HS256, SECRET, &claims);
        assert_eq!(service().verify(&token), Err(AuthError::TokenNotYetValid));
    }

    #[test]
    fn test_claims_of_wrong_shape() {
        let token = sign_with(Algorithm::HS256, SECRET, &json!({ "sub": "alice" }));
        assert_eq!(service().verify(&token), Err(AuthError::TokenClaimsInvalid));

        let token = sign_with(Algorithm::HS256, SECRET, &json!({ "user": 42 }));
        assert_eq!(service().verify(&token), Err(AuthError::TokenClaimsInvalid));
    }
}
