use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Access token claims.
///
/// The role is embedded so routes can make coarse decisions without a
/// database round-trip, but the authentication middleware still re-fetches
/// the user and rejects tokens whose persisted role has diverged.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Subject: the user's UUID as a string.
    pub sub: String,
    /// The user's role at issuance time (e.g. "ADMIN").
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

/// Refresh token claims. Carries only the subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}
