//! Client-side inspection of bearer tokens
//!
//! The client cannot verify signatures (the key lives on the server); it only reads
//! the claims to skip a pointless profile fetch for a token that already expired.

use crate::error::Result;
use jsonwebtoken::dangerous::insecure_decode;
use serde::{Deserialize, Serialize};

/// JWT claims the portal cares about
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Claims {
    /// Check if token is expired; tokens without `exp` never are
    pub fn is_expired(&self) -> bool {
        self.exp
            .is_some_and(|exp| chrono::Utc::now().timestamp() > exp)
    }
}

/// Decode claims without verifying the signature
pub fn peek_claims(token: &str) -> Result<Claims> {
    let data = insecure_decode::<Claims>(token)?;
    Ok(data.claims)
}

/// Whether the token is a JWT whose expiry has passed; opaque tokens are never
/// considered expired here and are left for the server to judge
pub fn is_expired(token: &str) -> bool {
    match peek_claims(token) {
        Ok(claims) => claims.is_expired(),
        Err(e) => {
            tracing::debug!("Token is not an inspectable JWT: {}", e);
            false
        }
    }
}
