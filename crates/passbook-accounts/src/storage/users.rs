//! User repository queries.

use super::db::{DatabaseError, UnitOfWork};
use super::models::User;

impl UnitOfWork {
    /// Insert a new user. Email/username collisions surface as
    /// [`DatabaseError::Conflict`].
    pub async fn add_user(&mut self, user: &User) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO users \
             (id, first_name, last_name, email, username, password_hash, \
              is_active, is_verified, created_at, updated_at, last_login_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.last_login_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    pub async fn get_user_by_id(&mut self, id: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    pub async fn get_user_by_email(&mut self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    pub async fn get_user_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    /// Persist the current state of `user` (everything but `id` and
    /// `created_at`).
    pub async fn update_user(&mut self, user: &User) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE users SET \
             first_name = ?, last_name = ?, email = ?, username = ?, \
             password_hash = ?, is_active = ?, is_verified = ?, \
             updated_at = ?, last_login_at = ? \
             WHERE id = ?",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.updated_at)
        .bind(user.last_login_at)
        .bind(&user.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    /// Delete a user. Returns whether a row was removed.
    pub async fn remove_user(&mut self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_users(&mut self, only_active: bool) -> Result<Vec<User>, DatabaseError> {
        let query = if only_active {
            "SELECT * FROM users WHERE is_active = 1 ORDER BY created_at"
        } else {
            "SELECT * FROM users ORDER BY created_at"
        };
        let users = sqlx::query_as::<_, User>(query)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(users)
    }
}
