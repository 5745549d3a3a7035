/// Postgres-backed user store
///
/// Uniqueness is enforced by the `UNIQUE` constraints on `users.email` and
/// `users.phone_number` (see `migrations/`); a violation comes back as
/// `StoreError::UniqueViolation`.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{NewUser, User, UserStore};
use crate::auth::UserId;
use crate::error::StoreError;

type UserRow = (i64, String, String, String, String, String);

fn into_user(row: UserRow) -> User {
    let (id, first_name, last_name, email, password_hash, phone_number) = row;
    User {
        id: UserId(id),
        first_name,
        last_name,
        email,
        password_hash,
        phone_number,
    }
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, phone_number
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(into_user))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, phone_number
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(into_user))
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash, phone_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone_number)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(user_id = id, "User row inserted");

        Ok(User {
            id: UserId(id),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            phone_number: user.phone_number,
        })
    }
}
