use async_trait::async_trait;
use sqlx::PgPool;

use crate::{common::error::AppError, db::UserStore, models::auth::User};

// The user repository, responsible for every interaction with the 'users' table
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Turns a unique-key violation on email into the domain conflict.
fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::EmailTaken;
        }
    }
    AppError::DatabaseError(e)
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn save(&self, user: User) -> Result<User, AppError> {
        match user.id {
            None => sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (full_name, email, password_hash, role, created_at, last_login)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(&user.full_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.created_at)
            .bind(user.last_login)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation),
            Some(id) => sqlx::query_as::<_, User>(
                r#"
                UPDATE users SET
                    full_name = $2, email = $3, password_hash = $4, role = $5, last_login = $6
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(&user.full_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.last_login)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_unique_violation)?
            .ok_or(AppError::UserNotFound),
        }
    }

    async fn count(&self) -> Result<u64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
