//! # CivicPulse Auth
//!
//! Authentication types and JWT utilities for the CivicPulse API.
//!
//! This crate provides:
//!
//! - [`claims`]: JWT claim structures for access and refresh tokens
//! - [`jwt`]: Token creation and verification utilities
//!
//! # Token Types
//!
//! - **Access Token** ([`Claims`]): short-lived, carries the subject id and
//!   role, proves identity for a single request window.
//! - **Refresh Token** ([`RefreshTokenClaims`]): longer-lived, carries only
//!   the subject id, used to mint new access tokens. Refresh tokens are
//!   additionally persisted server-side so they can be revoked; the JWT
//!   signature alone is not sufficient to refresh.

pub mod claims;
pub mod jwt;

// Re-export commonly used types at crate root
pub use claims::{Claims, RefreshTokenClaims};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};
