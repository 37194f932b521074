use std::str::FromStr;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde_json::Value;

use super::challenge::InvalidTokenReason;
use super::claims::Claims;
use super::error::StrategyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyFamily {
    Hmac,
    Rsa,
    Ec,
    Ed,
}

impl KeyFamily {
    fn of(alg: Algorithm) -> Self {
        match alg {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Self::Hmac,
            Algorithm::ES256 | Algorithm::ES384 => Self::Ec,
            Algorithm::EdDSA => Self::Ed,
            _ => Self::Rsa,
        }
    }

    fn algorithms(self) -> &'static [Algorithm] {
        match self {
            Self::Hmac => &[Algorithm::HS256, Algorithm::HS384, Algorithm::HS512],
            Self::Rsa => &[
                Algorithm::RS256,
                Algorithm::RS384,
                Algorithm::RS512,
                Algorithm::PS256,
                Algorithm::PS384,
                Algorithm::PS512,
            ],
            Self::Ec => &[Algorithm::ES256, Algorithm::ES384],
            Self::Ed => &[Algorithm::EdDSA],
        }
    }
}

/// Signature + registered-claims verifier.
///
/// - key material is either an HMAC secret or a PEM encoded public key
/// - `exp` / `nbf` are checked when present but not required
/// - `aud` / `iss` are only checked when an expectation is configured
#[derive(Clone)]
pub struct TokenVerifier {
    keys: Vec<(KeyFamily, DecodingKey)>,
    algorithms: Vec<Algorithm>,
    audience: Option<String>,
    issuer: Option<String>,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenVerifier")
            .field("algorithms", &self.algorithms)
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("leeway", &self.validation.leeway)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(
        secret_or_key: &[u8],
        algorithms: Option<Vec<Algorithm>>,
        audience: Option<String>,
        issuer: Option<String>,
        leeway_seconds: u64,
    ) -> Result<Self, StrategyError> {
        if secret_or_key.is_empty() {
            return Err(StrategyError::MissingKey);
        }

        let keys = decoding_keys(secret_or_key)?;

        let algorithms = match algorithms {
            Some(algs) if algs.is_empty() => return Err(StrategyError::EmptyAlgorithms),
            Some(algs) => algs,
            None => keys
                .iter()
                .flat_map(|(family, _)| family.algorithms().iter().copied())
                .collect(),
        };

        let mut validation = Validation::default();
        validation.leeway = leeway_seconds;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.required_spec_claims.clear();
        match &audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &issuer {
            validation.set_issuer(&[iss]);
        }

        Ok(Self {
            keys,
            algorithms,
            audience,
            issuer,
            validation,
        })
    }

    pub fn algorithms(&self) -> &[Algorithm] {
        &self.algorithms
    }

    /// Verify signature and claims, returning the decoded payload.
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidTokenReason> {
        let alg = inspect(token)?;
        if !self.algorithms.contains(&alg) {
            return Err(InvalidTokenReason::InvalidAlgorithm);
        }

        let family = KeyFamily::of(alg);
        let key = self
            .keys
            .iter()
            .find(|(f, _)| *f == family)
            .map(|(_, key)| key)
            .ok_or(InvalidTokenReason::InvalidAlgorithm)?;

        // jsonwebtoken requires every allowed algorithm to match the key family
        let mut validation = self.validation.clone();
        validation.algorithms = vec![alg];

        let data = jsonwebtoken::decode::<Claims>(token, key, &validation)
            .map_err(|err| self.classify(&err))?;

        // jsonwebtoken still accepts `exp == now`; a token is expired from its `exp` second on
        if let Some(exp) = data.claims.expires_at() {
            let leeway = chrono::Duration::seconds(self.validation.leeway as i64);
            if exp.checked_add_signed(leeway).is_some_and(|limit| Utc::now() >= limit) {
                return Err(InvalidTokenReason::Expired);
            }
        }

        Ok(data.claims)
    }

    fn classify(&self, err: &jsonwebtoken::errors::Error) -> InvalidTokenReason {
        match err.kind() {
            ErrorKind::InvalidSignature => InvalidTokenReason::InvalidSignature,
            ErrorKind::ExpiredSignature => InvalidTokenReason::Expired,
            ErrorKind::ImmatureSignature => InvalidTokenReason::NotActive,
            ErrorKind::InvalidAudience => self.audience_mismatch(),
            ErrorKind::InvalidIssuer => self.issuer_mismatch(),
            ErrorKind::MissingRequiredClaim(claim) if claim == "aud" => self.audience_mismatch(),
            ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => self.issuer_mismatch(),
            ErrorKind::InvalidAlgorithm => InvalidTokenReason::InvalidAlgorithm,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                InvalidTokenReason::Malformed
            }
            _ => InvalidTokenReason::Undecodable,
        }
    }

    fn audience_mismatch(&self) -> InvalidTokenReason {
        InvalidTokenReason::AudienceMismatch {
            expected: self.audience.clone().unwrap_or_default(),
        }
    }

    fn issuer_mismatch(&self) -> InvalidTokenReason {
        InvalidTokenReason::IssuerMismatch {
            expected: self.issuer.clone().unwrap_or_default(),
        }
    }
}

/// Structural checks done before handing the token to jsonwebtoken, which
/// cannot parse `alg: none` headers at all.
fn inspect(token: &str) -> Result<Algorithm, InvalidTokenReason> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(InvalidTokenReason::Malformed);
    };

    let header = decode_segment(header)?;
    decode_segment(payload)?;

    if signature.is_empty() {
        return Err(InvalidTokenReason::SignatureRequired);
    }

    let alg = header
        .get("alg")
        .and_then(Value::as_str)
        .ok_or(InvalidTokenReason::Undecodable)?;
    Algorithm::from_str(alg).map_err(|_| InvalidTokenReason::InvalidAlgorithm)
}

fn decode_segment(segment: &str) -> Result<Value, InvalidTokenReason> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| InvalidTokenReason::Malformed)?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(value @ Value::Object(_)) => Ok(value),
        _ => Err(InvalidTokenReason::Malformed),
    }
}

fn decoding_keys(material: &[u8]) -> Result<Vec<(KeyFamily, DecodingKey)>, StrategyError> {
    if !is_pem(material) {
        return Ok(vec![(KeyFamily::Hmac, DecodingKey::from_secret(material))]);
    }

    let mut keys = Vec::new();
    if let Ok(key) = DecodingKey::from_rsa_pem(material) {
        keys.push((KeyFamily::Rsa, key));
    }
    if let Ok(key) = DecodingKey::from_ec_pem(material) {
        keys.push((KeyFamily::Ec, key));
    }
    if let Ok(key) = DecodingKey::from_ed_pem(material) {
        keys.push((KeyFamily::Ed, key));
    }

    if keys.is_empty() {
        return Err(StrategyError::InvalidKey(
            "PEM is not an RSA, EC or Ed25519 public key".into(),
        ));
    }
    Ok(keys)
}

fn is_pem(material: &[u8]) -> bool {
    const MARKER: &[u8] = b"-----BEGIN ";
    material.windows(MARKER.len()).any(|w| w == MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::test_support::{SECRET, now, sign, sign_with, unsigned};
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(SECRET.as_bytes(), None, None, None, 0).unwrap()
    }

    #[test]
    fn valid_token_yields_claims() {
        let token = sign(json!({"sub": 1, "exp": now() + 900}));
        let claims = verifier().verify(&token).unwrap();
        assert_eq!(claims.subject().as_deref(), Some("1"));
    }

    #[test]
    fn token_without_exp_is_accepted() {
        let token = sign(json!({"sub": "alice"}));
        assert!(verifier().verify(&token).is_ok());
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(verifier().verify("WRONG"), Err(InvalidTokenReason::Malformed));
        assert_eq!(verifier().verify("a.b"), Err(InvalidTokenReason::Malformed));
        assert_eq!(verifier().verify("a.b.c.d"), Err(InvalidTokenReason::Malformed));
    }

    #[test]
    fn undecodable_segments_are_malformed() {
        for token in ["!!!.???.sig", "abc.def.", "e30.bm90LWpzb24.c2ln"] {
            let reason = verifier().verify(token).unwrap_err();
            assert_eq!(reason, InvalidTokenReason::Malformed, "token {token:?}");
            assert_eq!(reason.to_string(), "Invalid token (jwt malformed)");
        }
    }

    #[test]
    fn header_without_alg_is_an_invalid_token() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":1}"#);
        let reason = verifier()
            .verify(&format!("{header}.{payload}.c2ln"))
            .unwrap_err();
        assert_eq!(reason.to_string(), "Invalid token (invalid token)");
    }

    #[test]
    fn wrong_key_is_invalid_signature() {
        let token = sign_with(
            Algorithm::HS256,
            &format!("{SECRET}x"),
            json!({"sub": 1, "exp": now() + 900}),
        );
        assert_eq!(
            verifier().verify(&token),
            Err(InvalidTokenReason::InvalidSignature)
        );
    }

    #[test]
    fn past_exp_is_expired() {
        let token = sign(json!({"sub": 1, "exp": now() - 60}));
        assert_eq!(verifier().verify(&token), Err(InvalidTokenReason::Expired));
    }

    #[test]
    fn exp_equal_to_now_is_expired() {
        let token = sign(json!({"sub": 1, "exp": now()}));
        assert_eq!(verifier().verify(&token), Err(InvalidTokenReason::Expired));
    }

    #[test]
    fn leeway_tolerates_recent_expiry() {
        let verifier = TokenVerifier::new(SECRET.as_bytes(), None, None, None, 120).unwrap();
        let token = sign(json!({"sub": 1, "exp": now() - 60}));
        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn future_nbf_is_not_active() {
        let token = sign(json!({"sub": 1, "nbf": now() + 600}));
        assert_eq!(verifier().verify(&token), Err(InvalidTokenReason::NotActive));
    }

    #[test]
    fn unsigned_token_requires_signature() {
        let token = unsigned(json!({"sub": 1, "exp": now() + 900}));
        assert_eq!(
            verifier().verify(&token),
            Err(InvalidTokenReason::SignatureRequired)
        );
    }

    #[test]
    fn audience_mismatch_names_expected_value() {
        let verifier =
            TokenVerifier::new(SECRET.as_bytes(), None, Some("foo".into()), None, 0).unwrap();

        let wrong = sign(json!({"sub": 1, "aud": "bar"}));
        let missing = sign(json!({"sub": 1}));
        for token in [wrong, missing] {
            assert_eq!(
                verifier.verify(&token),
                Err(InvalidTokenReason::AudienceMismatch {
                    expected: "foo".into()
                })
            );
        }

        let listed = sign(json!({"sub": 1, "aud": ["bar", "foo"]}));
        assert!(verifier.verify(&listed).is_ok());
    }

    #[test]
    fn unconfigured_audience_is_ignored() {
        let token = sign(json!({"sub": 1, "aud": "anything"}));
        assert!(verifier().verify(&token).is_ok());
    }

    #[test]
    fn issuer_mismatch_names_expected_value() {
        let verifier =
            TokenVerifier::new(SECRET.as_bytes(), None, None, Some("foo".into()), 0).unwrap();

        let token = sign(json!({"sub": 1, "iss": "bar"}));
        assert_eq!(
            verifier.verify(&token),
            Err(InvalidTokenReason::IssuerMismatch {
                expected: "foo".into()
            })
        );

        let ok = sign(json!({"sub": 1, "iss": "foo"}));
        assert!(verifier.verify(&ok).is_ok());
    }

    #[test]
    fn algorithm_outside_allow_list_is_rejected() {
        let verifier = TokenVerifier::new(
            SECRET.as_bytes(),
            Some(vec![Algorithm::HS512]),
            None,
            None,
            0,
        )
        .unwrap();

        let token = sign(json!({"sub": 1}));
        assert_eq!(
            verifier.verify(&token),
            Err(InvalidTokenReason::InvalidAlgorithm)
        );

        let allowed = sign_with(Algorithm::HS512, SECRET, json!({"sub": 1}));
        assert!(verifier.verify(&allowed).is_ok());
    }

    #[test]
    fn asymmetric_alg_against_hmac_secret_is_rejected() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":1}"#);
        let token = format!("{header}.{payload}.c2ln");
        assert_eq!(
            verifier().verify(&token),
            Err(InvalidTokenReason::InvalidAlgorithm)
        );
    }

    #[test]
    fn construction_rejects_bad_key_material() {
        assert!(matches!(
            TokenVerifier::new(b"", None, None, None, 0),
            Err(StrategyError::MissingKey)
        ));
        assert!(matches!(
            TokenVerifier::new(
                b"-----BEGIN PUBLIC KEY-----\nnot a key\n-----END PUBLIC KEY-----\n",
                None,
                None,
                None,
                0
            ),
            Err(StrategyError::InvalidKey(_))
        ));
        assert!(matches!(
            TokenVerifier::new(SECRET.as_bytes(), Some(Vec::new()), None, None, 0),
            Err(StrategyError::EmptyAlgorithms)
        ));
    }

    const RSA_PRIVATE: &str = include_str!("testdata/rsa_private.pem");
    const RSA_PUBLIC: &str = include_str!("testdata/rsa_public.pem");
    const EC_PRIVATE: &str = include_str!("testdata/ec_private.pem");
    const EC_PUBLIC: &str = include_str!("testdata/ec_public.pem");
    const ED_PRIVATE: &str = include_str!("testdata/ed_private.pem");
    const ED_PUBLIC: &str = include_str!("testdata/ed_public.pem");

    fn sign_pem(alg: Algorithm, key: EncodingKey, claims: Value) -> String {
        jsonwebtoken::encode(&Header::new(alg), &claims, &key).unwrap()
    }

    fn pem_verifier(public: &str) -> TokenVerifier {
        TokenVerifier::new(public.as_bytes(), None, None, None, 0).unwrap()
    }

    #[test]
    fn rsa_public_key_verifies_rs256() {
        let key = EncodingKey::from_rsa_pem(RSA_PRIVATE.as_bytes()).unwrap();
        let token = sign_pem(Algorithm::RS256, key, json!({"sub": "rsa", "exp": now() + 900}));

        let verifier = pem_verifier(RSA_PUBLIC);
        assert_eq!(
            verifier.algorithms(),
            &[
                Algorithm::RS256,
                Algorithm::RS384,
                Algorithm::RS512,
                Algorithm::PS256,
                Algorithm::PS384,
                Algorithm::PS512,
            ]
        );
        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.subject().as_deref(), Some("rsa"));
    }

    #[test]
    fn ec_public_key_verifies_es256() {
        let key = EncodingKey::from_ec_pem(EC_PRIVATE.as_bytes()).unwrap();
        let token = sign_pem(Algorithm::ES256, key, json!({"sub": "ec"}));

        let verifier = pem_verifier(EC_PUBLIC);
        assert_eq!(verifier.algorithms(), &[Algorithm::ES256, Algorithm::ES384]);
        assert_eq!(
            verifier.verify(&token).unwrap().subject().as_deref(),
            Some("ec")
        );
    }

    #[test]
    fn ed25519_public_key_verifies_eddsa() {
        let key = EncodingKey::from_ed_pem(ED_PRIVATE.as_bytes()).unwrap();
        let token = sign_pem(Algorithm::EdDSA, key, json!({"sub": "ed"}));

        let verifier = pem_verifier(ED_PUBLIC);
        assert_eq!(verifier.algorithms(), &[Algorithm::EdDSA]);
        assert_eq!(
            verifier.verify(&token).unwrap().subject().as_deref(),
            Some("ed")
        );
    }

    #[test]
    fn pem_signature_from_another_key_is_invalid() {
        let key = EncodingKey::from_ec_pem(EC_PRIVATE.as_bytes()).unwrap();
        let token = sign_pem(Algorithm::ES256, key, json!({"sub": "ec"}));
        let rsa_only = pem_verifier(RSA_PUBLIC);
        assert_eq!(rsa_only.verify(&token), Err(InvalidTokenReason::InvalidAlgorithm));
    }

    #[test]
    fn hmac_token_keyed_with_public_pem_is_refused() {
        for public in [RSA_PUBLIC, EC_PUBLIC, ED_PUBLIC] {
            let forged = sign_with(Algorithm::HS256, public, json!({"sub": "mallory"}));
            assert_eq!(
                pem_verifier(public).verify(&forged),
                Err(InvalidTokenReason::InvalidAlgorithm)
            );
        }
    }

    #[test]
    fn hmac_allow_list_on_a_pem_key_still_refuses_hmac() {
        let verifier = TokenVerifier::new(
            RSA_PUBLIC.as_bytes(),
            Some(vec![Algorithm::RS256, Algorithm::HS256]),
            None,
            None,
            0,
        )
        .unwrap();
        let forged = sign_with(Algorithm::HS256, RSA_PUBLIC, json!({"sub": "mallory"}));
        assert_eq!(verifier.verify(&forged), Err(InvalidTokenReason::InvalidAlgorithm));
    }

    #[test]
    fn hmac_secret_defaults_to_hs_family() {
        assert_eq!(
            verifier().algorithms(),
            &[Algorithm::HS256, Algorithm::HS384, Algorithm::HS512]
        );
    }
}
