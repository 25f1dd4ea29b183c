use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Share links stay valid for a week; long enough to land in an inbox,
/// short enough that forwarding an old mail does not open a door forever.
pub const LINK_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Generate a signed, URL-safe share token for a swap request.
/// Token format: base64url(request_id:expiry_timestamp:hmac_signature).
///
/// This is a signed reference, not encryption: the request id is readable
/// by anyone holding the token, but the signature stops tampering.
pub fn generate_link_token(
    request_id: Uuid,
    secret: &str,
) -> Result<(String, DateTime<Utc>), AppError> {
    let expiry_time = Utc::now().timestamp() + LINK_TTL_SECONDS;

    let payload = format!("{request_id}:{expiry_time}");
    let signature = create_hmac_signature(&payload, secret)?;
    let token_data = format!("{payload}:{signature}");

    let token = URL_SAFE_NO_PAD.encode(token_data.as_bytes());
    let expires_at = Utc
        .timestamp_opt(expiry_time, 0)
        .single()
        .ok_or_else(|| AppError::Internal("Invalid link expiry timestamp".to_string()))?;

    Ok((token, expires_at))
}

/// Validate a share token and extract the swap-request id it references.
pub fn validate_link_token(token: &str, secret: &str) -> Result<Uuid, AppError> {
    let decoded_bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| AppError::Unauthorized("Invalid link token format".to_string()))?;

    let decoded = String::from_utf8(decoded_bytes)
        .map_err(|_| AppError::Unauthorized("Invalid link token encoding".to_string()))?;

    // Parse token: request_id:expiry_time:signature
    let parts: Vec<&str> = decoded.split(':').collect();
    if parts.len() != 3 {
        return Err(AppError::Unauthorized(
            "Invalid link token structure".to_string(),
        ));
    }

    let request_id: Uuid = parts[0]
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid request id in link token".to_string()))?;

    let expiry_time: i64 = parts[1]
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid expiry time in link token".to_string()))?;

    let token_signature = parts[2];

    // Verify the signature before trusting anything else in the payload.
    let payload = format!("{request_id}:{expiry_time}");
    let expected_signature = create_hmac_signature(&payload, secret)?;

    let matches: bool = token_signature
        .as_bytes()
        .ct_eq(expected_signature.as_bytes())
        .into();
    if !matches {
        return Err(AppError::Unauthorized("Invalid link token".to_string()));
    }

    if Utc::now().timestamp() > expiry_time {
        return Err(AppError::Unauthorized(
            "This share link has expired".to_string(),
        ));
    }

    Ok(request_id)
}

/// Create HMAC-SHA256 signature for the given data
fn create_hmac_signature(data: &str, secret: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("HMAC initialization error: {e}")))?;

    mac.update(data.as_bytes());

    let result = mac.finalize();
    let code_bytes = result.into_bytes();

    Ok(hex::encode(code_bytes))
}
