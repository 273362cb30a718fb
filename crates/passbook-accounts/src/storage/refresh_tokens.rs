//! Refresh-token ledger queries.

use super::db::{DatabaseError, UnitOfWork};
use super::models::RefreshToken;

impl UnitOfWork {
    /// Insert a ledger row. A colliding `id` surfaces as
    /// [`DatabaseError::Conflict`].
    pub async fn add_refresh_token(&mut self, token: &RefreshToken) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO refresh_tokens \
             (id, user_id, jti, fingerprint, created_at, expires_at, revoked) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&token.id)
        .bind(&token.user_id)
        .bind(&token.jti)
        .bind(&token.fingerprint)
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.revoked)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    pub async fn get_refresh_token(
        &mut self,
        id: &str,
    ) -> Result<Option<RefreshToken>, DatabaseError> {
        let token = sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(token)
    }

    /// Flip the revoked flag on. Returns whether this call performed the
    /// flip: rotation uses the flag as its atomic single-use claim, logout
    /// ignores it, which makes repeated revocation a no-op.
    pub async fn revoke_refresh_token(&mut self, id: &str) -> Result<bool, DatabaseError> {
        let result =
            sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE id = ? AND revoked = 0")
                .bind(id)
                .execute(&mut *self.tx)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
