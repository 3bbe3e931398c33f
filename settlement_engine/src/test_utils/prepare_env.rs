use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::SqliteDatabase;

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
}

/// A fresh database file in the system temp directory.
pub fn random_db_path() -> String {
    format!("sqlite://{}/shop_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 1).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("Could not drop database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

/// Makes every update to the `clients` table fail, so that settlement breaks after the stock has already been taken.
pub async fn block_client_updates(db: &SqliteDatabase) {
    sqlx::query(
        r#"
            CREATE TRIGGER block_client_updates BEFORE UPDATE ON clients
            BEGIN
                SELECT RAISE(ABORT, 'client updates are blocked');
            END;
        "#,
    )
    .execute(db.pool())
    .await
    .expect("Error creating trigger");
}

pub async fn unblock_client_updates(db: &SqliteDatabase) {
    sqlx::query("DROP TRIGGER IF EXISTS block_client_updates")
        .execute(db.pool())
        .await
        .expect("Error dropping trigger");
}
