use exam_core::model::{User, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_user_row, ser, user_id_from_i64};
use crate::repository::{StorageError, UserRecord, UserRepository};

fn conn(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e
        && db.is_unique_violation()
    {
        return StorageError::Conflict;
    }
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_new_user(&self, record: &UserRecord) -> Result<UserId, StorageError> {
        let user = &record.user;
        let res = sqlx::query(
            r"
            INSERT INTO users (username, password, display_name, role, position, language)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(user.username())
        .bind(record.password.as_str())
        .bind(user.display_name())
        .bind(user.role().as_str())
        .bind(user.position())
        .bind(user.language())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        user_id_from_i64(res.last_insert_rowid())
    }

    async fn upsert_user(&self, record: &UserRecord) -> Result<(), StorageError> {
        let user = &record.user;
        sqlx::query(
            r"
            INSERT INTO users (id, username, password, display_name, role, position, language)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                password = excluded.password,
                display_name = excluded.display_name,
                role = excluded.role,
                position = excluded.position,
                language = excluded.language
            ",
        )
        .bind(id_to_i64("user_id", user.id().value())?)
        .bind(user.username())
        .bind(record.password.as_str())
        .bind(user.display_name())
        .bind(user.role().as_str())
        .bind(user.position())
        .bind(user.language())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, username, password, display_name, role, position, language
            FROM users WHERE username = ?1
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => {
                let password: String = row.try_get("password").map_err(ser)?;
                Ok(Some(UserRecord {
                    user: map_user_row(&row)?,
                    password,
                }))
            }
            None => Ok(None),
        }
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, username, display_name, role, position, language
            FROM users
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(map_user_row(&row)?);
        }
        Ok(users)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id_to_i64("user_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
