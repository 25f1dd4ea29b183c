use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::SessionClaims;

/// Issuer the portal stamps into every session token.
pub const SESSION_ISSUER: &str = "pascs-portal";

/// Validate a portal session token (HS256, shared secret) and return its
/// claims. Expiry and issuer are both enforced.
pub fn validate_session_token(token: &str, secret: &str) -> Result<SessionClaims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[SESSION_ISSUER]);
    validation.validate_exp = true;

    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| format!("Session token validation failed: {e}"))?;

    Ok(token_data.claims)
}

/// Issue a session token. The portal is the normal issuer; this exists for
/// local tooling and tests.
pub fn issue_session_token(
    staff_id: i32,
    name: &str,
    ttl_seconds: i64,
    secret: &str,
) -> Result<String, String> {
    let now = chrono::Utc::now().timestamp();
    let claims = SessionClaims {
        sub: staff_id.to_string(),
        name: name.to_string(),
        exp: now + ttl_seconds,
        iat: now,
        iss: SESSION_ISSUER.to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("Failed to issue session token: {e}"))
}
