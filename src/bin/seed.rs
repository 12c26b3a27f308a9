//! Seed script for development — populates a fresh database with sample data.
//!
//! Usage: `cargo run --bin seed`
//!
//! Requires `DATABASE_URL` (reads .env).

use sqlx::PgPool;

const SEED_PASSWORD: &str = "Test123!";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let db_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    // Run migrations first
    sqlx::migrate!("./migrations").run(&pool).await?;

    println!("=== smsledger Seed Script ===");

    seed_users(&pool).await?;
    seed_banks(&pool).await?;
    seed_merchant_categories(&pool).await?;

    println!("\n=== Seed complete! ===");
    println!("Logins: admin / maker1 / checker1 / user1, password {SEED_PASSWORD}");

    Ok(())
}

async fn seed_users(pool: &PgPool) -> anyhow::Result<()> {
    let hash = smsledger::services::auth::hash_password(SEED_PASSWORD)?;

    let users = [
        ("admin", "Administrator", "ADMIN"),
        ("maker1", "Maker One", "MAKER"),
        ("checker1", "Checker One", "CHECKER"),
        ("user1", "User One", "USER"),
    ];

    for (username, display_name, role) in users {
        sqlx::query(
            "INSERT INTO users (username, email, password_hash, display_name, role)
             VALUES ($1, $2, $3, $4, $5::user_role)
             ON CONFLICT (username) DO UPDATE SET password_hash = EXCLUDED.password_hash",
        )
        .bind(username)
        .bind(format!("{username}@smsledger.local"))
        .bind(&hash)
        .bind(display_name)
        .bind(role)
        .execute(pool)
        .await?;
    }

    println!("[done] Seeded role users");
    Ok(())
}

async fn seed_banks(pool: &PgPool) -> anyhow::Result<()> {
    for name in ["SBI", "HDFCBK", "ICICIB", "AXISBK", "KOTAKB"] {
        sqlx::query("INSERT INTO banks (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(pool)
            .await?;
    }
    println!("[done] Seeded banks");
    Ok(())
}

async fn seed_merchant_categories(pool: &PgPool) -> anyhow::Result<()> {
    let rows = [
        ("ZOMATO", "FOOD"),
        ("SWIGGY", "FOOD"),
        ("AMAZON", "SHOPPING"),
        ("FLIPKART", "SHOPPING"),
        ("IRCTC", "TRAVEL"),
        ("NETFLIX", "ENTERTAINMENT"),
        ("AIRTEL", "BILLS"),
    ];
    for (merchant, category) in rows {
        sqlx::query(
            "INSERT INTO merchant_categories (merchant_name, category)
             VALUES ($1, $2::message_subtype)
             ON CONFLICT (merchant_name) DO NOTHING",
        )
        .bind(merchant)
        .bind(category)
        .execute(pool)
        .await?;
    }
    println!("[done] Seeded merchant categories");
    Ok(())
}
