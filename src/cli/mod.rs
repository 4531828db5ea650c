pub mod seeder;

use sqlx::PgPool;

use civicpulse_core::hash_password;

use crate::modules::users::model::UserRole;

/// Creates a system administrator. Admins have global scope and can only
/// be created here, never through the API.
pub async fn create_admin(
    db: &PgPool,
    name: &str,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let hashed_password =
        hash_password(password).map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let result = sqlx::query(
        "INSERT INTO users (email, password, name, role, municipality_id) \
         VALUES ($1, $2, $3, $4, NULL) \
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(email)
    .bind(&hashed_password)
    .bind(name)
    .bind(UserRole::Admin)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err("User with this email already exists".into());
    }

    Ok(())
}
