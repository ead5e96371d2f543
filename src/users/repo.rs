use async_trait::async_trait;
use sqlx::PgPool;

use crate::users::repo_types::{NewUser, ProfileChanges, User, UserProfile};

/// Name of the unique constraint guarding `users.phone_number`.
pub const PHONE_CONSTRAINT: &str = "users_phone_number_key";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("phone number already registered")]
    DuplicatePhone,
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() && db.constraint() == Some(PHONE_CONSTRAINT) {
                return StoreError::DuplicatePhone;
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Access to the `users` relation.
///
/// Mutations keyed by session or id report whether a row matched, so callers
/// can tell "not found" from success without a second read.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn phone_exists(&self, phone: &str) -> StoreResult<bool>;
    async fn insert(&self, user: NewUser) -> StoreResult<i64>;
    async fn find_by_phone(&self, phone: &str) -> StoreResult<Option<User>>;
    async fn find_by_session(&self, session: &str) -> StoreResult<Option<User>>;
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    async fn set_session(&self, id: i64, session: &str) -> StoreResult<bool>;
    async fn clear_session(&self, session: &str) -> StoreResult<bool>;
    async fn replace_session(&self, old: &str, new: &str) -> StoreResult<bool>;
    async fn set_password_hash(&self, id: i64, hash: &str) -> StoreResult<bool>;
    async fn list_profiles(&self) -> StoreResult<Vec<UserProfile>>;
    async fn find_profile(&self, id: i64) -> StoreResult<Option<UserProfile>>;
    async fn update_profile(
        &self,
        id: i64,
        changes: &ProfileChanges,
    ) -> StoreResult<Option<UserProfile>>;
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const USER_COLUMNS: &str =
    "id, name, surname, phone_number, balance::float8 AS balance, password_hash, session";
const PROFILE_COLUMNS: &str = "id, name, surname, phone_number, balance::float8 AS balance";

#[async_trait]
impl UserStore for PgUserStore {
    async fn phone_exists(&self, phone: &str) -> StoreResult<bool> {
        let row = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE phone_number = $1")
            .bind(phone)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.is_some())
    }

    async fn insert(&self, user: NewUser) -> StoreResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (name, surname, phone_number, balance, password_hash, session)
            VALUES ($1, $2, $3, $4::float8, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&user.name)
        .bind(&user.surname)
        .bind(&user.phone_number)
        .bind(user.balance)
        .bind(&user.password_hash)
        .bind(&user.session)
        .fetch_one(&self.db)
        .await?;
        Ok(id)
    }

    async fn find_by_phone(&self, phone: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE phone_number = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(phone)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_session(&self, session: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE session = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(session)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn set_session(&self, id: i64, session: &str) -> StoreResult<bool> {
        let res = sqlx::query("UPDATE users SET session = $1 WHERE id = $2")
            .bind(session)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn clear_session(&self, session: &str) -> StoreResult<bool> {
        let res = sqlx::query("UPDATE users SET session = NULL WHERE session = $1")
            .bind(session)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn replace_session(&self, old: &str, new: &str) -> StoreResult<bool> {
        // Single statement: the old token stops matching the moment the new one lands.
        let res = sqlx::query("UPDATE users SET session = $1 WHERE session = $2")
            .bind(new)
            .bind(old)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_password_hash(&self, id: i64, hash: &str) -> StoreResult<bool> {
        let res = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(hash)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_profiles(&self) -> StoreResult<Vec<UserProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM users ORDER BY id");
        let rows = sqlx::query_as::<_, UserProfile>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn find_profile(&self, id: i64) -> StoreResult<Option<UserProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserProfile>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn update_profile(
        &self,
        id: i64,
        changes: &ProfileChanges,
    ) -> StoreResult<Option<UserProfile>> {
        let sql = format!(
            r#"
            UPDATE users
               SET name = COALESCE($2, name),
                   surname = COALESCE($3, surname),
                   phone_number = COALESCE($4, phone_number)
             WHERE id = $1
         RETURNING {PROFILE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserProfile>(&sql)
            .bind(id)
            .bind(changes.name.as_deref())
            .bind(changes.surname.as_deref())
            .bind(changes.phone_number.as_deref())
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
