use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../migrations");

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub fn create_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .expect("Failed to create database pool");

    // Run pending migrations on startup
    let mut conn = pool
        .get()
        .expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");

    pool
}

/// Check out a pooled connection inside a handler returning `impl IntoResponse`,
/// answering 500 when the pool is exhausted or the database is unreachable.
#[macro_export]
macro_rules! get_conn {
    ($pool:expr) => {
        match $pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!("Failed to get database connection: {}", e);
                return (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json($crate::api::ErrorResponse {
                        error: "Database connection failed".to_string(),
                    }),
                )
                    .into_response();
            }
        }
    };
}
