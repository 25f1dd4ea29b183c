use serde::{Deserialize, Serialize};

/// Claims of a portal-issued session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,  // staff profile id, as a string
    pub name: String, // display name at issue time
    pub exp: i64,     // Expiration timestamp
    pub iat: i64,     // Issued at timestamp
    pub iss: String,  // Issuer
}
