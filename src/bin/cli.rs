use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;

use civicpulse::cli::seeder::{SeedCounts, seed_demo};
use civicpulse::cli::create_admin;

#[derive(Parser)]
#[command(name = "civicpulse-cli")]
#[command(about = "CivicPulse CLI - Administrative tools for CivicPulse", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a system administrator account
    CreateAdmin {
        /// Display name of the administrator
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed the database with demo municipalities, users and feedback
    SeedDemo {
        /// Number of municipalities to create
        #[arg(short = 'm', long, default_value = "3")]
        municipalities: usize,

        /// Number of citizen users per municipality
        #[arg(long, default_value = "5")]
        users: usize,

        /// Number of feedback records per municipality
        #[arg(long, default_value = "20")]
        feedback: usize,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    let cli = Cli::parse();

    match cli.command {
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => {
            let name = name.unwrap_or_else(|| {
                Input::<String>::new()
                    .with_prompt("Display name")
                    .interact_text()
                    .expect("Failed to read name")
            });
            let email = email.unwrap_or_else(|| {
                Input::<String>::new()
                    .with_prompt("Email")
                    .interact_text()
                    .expect("Failed to read email")
            });
            let password = password.unwrap_or_else(|| {
                Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Confirm password", "Passwords do not match")
                    .interact()
                    .expect("Failed to read password")
            });

            match create_admin(&pool, &name, &email, &password).await {
                Ok(()) => {
                    println!("✅ Administrator created successfully!");
                    println!("   Email: {}", email);
                    println!("   Name: {}", name);
                }
                Err(e) => {
                    eprintln!("❌ Error creating administrator: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::SeedDemo {
            municipalities,
            users,
            feedback,
        } => {
            let counts = SeedCounts {
                municipalities,
                users_per_municipality: users,
                feedback_per_municipality: feedback,
            };
            if let Err(e) = seed_demo(&pool, counts).await {
                eprintln!("❌ Seeding failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}
