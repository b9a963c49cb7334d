use crate::db::models::{DbUser, NewUser};
use crate::db::schema::SQLITE_INIT;
use crate::db::traits::UserGateway;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

pub type SqlitePool = Pool<Sqlite>;

/// Open a pool for `database_url` and verify it answers a trivial query.
///
/// A pool that connects but cannot run `SELECT 1` is reported as a failure,
/// and closed before returning.
pub async fn connect(database_url: &str) -> Result<SqlitePool, StoreError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(connect_opts)
        .await?;

    if let Err(e) = ping(&pool).await {
        pool.close().await;
        return Err(e);
    }
    Ok(pool)
}

async fn ping(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[derive(Clone)]
pub struct UserStorage {
    pool: SqlitePool,
}

impl UserStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserGateway for UserStorage {
    async fn create_user(&self, user: NewUser) -> Result<DbUser, StoreError> {
        let row = sqlx::query_as::<_, DbUser>(
            r#"
            INSERT INTO users (name, email, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_users(&self) -> Result<Vec<DbUser>, StoreError> {
        let rows = sqlx::query_as::<_, DbUser>(
            r#"SELECT id, name, email, password_hash, created_at
               FROM users ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
