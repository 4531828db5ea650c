//! Demo data seeder: fake municipalities, staff, citizens and feedback.

use chrono::{Duration, Utc};
use fake::Fake;
use fake::faker::address::en::{CityName, CountryName, StateName, StreetName};
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use rand::Rng;
use rand::seq::SliceRandom;
use sqlx::PgPool;
use uuid::Uuid;

use crate::modules::feedback::model::{FeedbackCategory, FeedbackStatus};
use crate::modules::users::model::UserRole;

pub struct SeedCounts {
    pub municipalities: usize,
    pub users_per_municipality: usize,
    pub feedback_per_municipality: usize,
}

impl Default for SeedCounts {
    fn default() -> Self {
        Self {
            municipalities: 3,
            users_per_municipality: 5,
            feedback_per_municipality: 20,
        }
    }
}

const CATEGORIES: &[FeedbackCategory] = &[
    FeedbackCategory::Infrastructure,
    FeedbackCategory::Safety,
    FeedbackCategory::Cleanliness,
    FeedbackCategory::Other,
];

const STATUSES: &[FeedbackStatus] = &[
    FeedbackStatus::Pending,
    FeedbackStatus::InProgress,
    FeedbackStatus::Resolved,
    FeedbackStatus::Rejected,
];

/// Seeds the database with demo municipalities, a municipality admin and
/// citizens for each, and a batch of feedback in mixed lifecycle states.
///
/// All seeded accounts share the password "password" (bcrypt cost 4, demo
/// data only).
pub async fn seed_demo(db: &PgPool, counts: SeedCounts) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = rand::thread_rng();
    let password_hash = bcrypt::hash("password", 4)?;

    println!("🌱 Seeding demo data...");

    for _ in 0..counts.municipalities {
        let city: String = CityName().fake();
        let municipality_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO municipalities (name, city, state, country, contact_email) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(format!("City of {}", city))
        .bind(&city)
        .bind(StateName().fake::<String>())
        .bind(CountryName().fake::<String>())
        .bind(format!("contact@{}.example.com", city.to_lowercase().replace(' ', "-")))
        .fetch_one(db)
        .await?;

        let admin_id = insert_user(
            db,
            &password_hash,
            UserRole::MunicipalityAdmin,
            Some(municipality_id),
        )
        .await?;

        let mut citizen_ids = vec![admin_id];
        for _ in 0..counts.users_per_municipality {
            let id = insert_user(db, &password_hash, UserRole::User, Some(municipality_id)).await?;
            citizen_ids.push(id);
        }

        for _ in 0..counts.feedback_per_municipality {
            let status = *STATUSES.choose(&mut rng).unwrap();
            let category = *CATEGORIES.choose(&mut rng).unwrap();
            let author = *citizen_ids.choose(&mut rng).unwrap();
            let created_at = Utc::now() - Duration::hours(rng.gen_range(1..24 * 30));
            let resolved_at = (status == FeedbackStatus::Resolved)
                .then(|| created_at + Duration::hours(rng.gen_range(1..24 * 7)));

            sqlx::query(
                "INSERT INTO feedback \
                 (description, category, status, latitude, longitude, address, user_id, \
                  municipality_id, created_at, resolved_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(Sentence(5..12).fake::<String>())
            .bind(category)
            .bind(status)
            .bind(rng.gen_range(-90.0..90.0))
            .bind(rng.gen_range(-180.0..180.0))
            .bind(format!("{} {}", rng.gen_range(1..200), StreetName().fake::<String>()))
            .bind(author)
            .bind(municipality_id)
            .bind(created_at)
            .bind(resolved_at)
            .execute(db)
            .await?;
        }

        println!(
            "   ✓ {} — {} users, {} feedback",
            city,
            counts.users_per_municipality + 1,
            counts.feedback_per_municipality
        );
    }

    println!("✅ Seeding complete");

    Ok(())
}

async fn insert_user(
    db: &PgPool,
    password_hash: &str,
    role: UserRole,
    municipality_id: Option<Uuid>,
) -> Result<Uuid, Box<dyn std::error::Error>> {
    // A uuid suffix keeps generated emails unique across runs.
    let email: String = SafeEmail().fake();
    let email = format!("{}-{}", Uuid::new_v4().simple(), email);

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (email, password, name, role, municipality_id) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&email)
    .bind(password_hash)
    .bind(Name().fake::<String>())
    .bind(role)
    .bind(municipality_id)
    .fetch_one(db)
    .await?;

    Ok(id)
}
