//! User data models and DTOs.
//!
//! # System roles
//!
//! | Role | Scope |
//! |------|-------|
//! | ADMIN | Global: every municipality, every record |
//! | MUNICIPALITY_ADMIN | Their own municipality's records |
//! | USER | Their own municipality; for mutation only records they authored |

use civicpulse_core::serde::deserialize_optional_uuid;
use civicpulse_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A user's role, stored as the `user_role` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    MunicipalityAdmin,
    User,
}

impl UserRole {
    /// The wire/claims representation, identical to the database label.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::MunicipalityAdmin => "MUNICIPALITY_ADMIN",
            UserRole::User => "USER",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(UserRole::Admin),
            "MUNICIPALITY_ADMIN" => Ok(UserRole::MunicipalityAdmin),
            "USER" => Ok(UserRole::User),
            other => Err(format!("Invalid role: {}", other)),
        }
    }
}

/// A user as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub municipality_id: Option<Uuid>,
    pub language: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Columns selected for [`User`] rows.
pub const USER_COLUMNS: &str =
    "id, email, name, phone, role, municipality_id, language, created_at, updated_at";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserDto {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub municipality_id: Option<Uuid>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserDto {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub municipality_id: Option<Uuid>,
    pub language: Option<String>,
}

impl UpdateUserDto {
    /// True when the update touches fields only an ADMIN may change.
    pub fn touches_privileged_fields(&self) -> bool {
        self.role.is_some() || self.municipality_id.is_some()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserFilterParams {
    pub role: Option<UserRole>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub municipality_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<User>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_round_trips_through_strings() {
        for role in [UserRole::Admin, UserRole::MunicipalityAdmin, UserRole::User] {
            assert_eq!(UserRole::from_str(role.as_str()).unwrap(), role);
        }
        assert!(UserRole::from_str("SUPERUSER").is_err());
    }

    #[test]
    fn role_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&UserRole::MunicipalityAdmin).unwrap(),
            r#""MUNICIPALITY_ADMIN""#
        );
    }

    #[test]
    fn privileged_field_detection() {
        let plain = UpdateUserDto {
            email: None,
            password: None,
            name: Some("New Name".into()),
            phone: None,
            role: None,
            municipality_id: None,
            language: Some("de".into()),
        };
        assert!(!plain.touches_privileged_fields());

        let privileged = UpdateUserDto {
            role: Some(UserRole::Admin),
            ..plain
        };
        assert!(privileged.touches_privileged_fields());
    }
}
