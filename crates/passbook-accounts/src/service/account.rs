//! Account flows: registration, login, refresh, and logout.
//!
//! Each flow runs in one unit of work, so the refresh-ledger write commits
//! transactionally with the user write that triggered it, and any rejection
//! or failure rolls the whole operation back.

use tracing::instrument;

use crate::auth::TokenPayload;
use crate::storage::{AccountsDatabase, DatabaseError, User};

use super::auth::{AuthError, AuthService, TokenPair};
use super::users::{NewUser, UserError, UserService};

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Facade over the user and auth services, owning the database handle and
/// the transaction boundary of each logical operation.
pub struct AccountService {
    db: AccountsDatabase,
    users: UserService,
    auth: AuthService,
}

impl AccountService {
    pub fn new(db: AccountsDatabase, users: UserService, auth: AuthService) -> Self {
        Self { db, users, auth }
    }

    /// Create the user and issue their first session in one transaction.
    #[instrument(skip_all, fields(email = %new_user.email))]
    pub async fn register(
        &self,
        new_user: NewUser,
        fingerprint: &str,
    ) -> Result<(User, TokenPair), AccountError> {
        let mut uow = self.db.begin().await?;
        let user = self.users.register(&mut uow, new_user).await?;
        let pair = self
            .auth
            .create_token_pair(&mut uow, &user.id, fingerprint)
            .await?;
        uow.commit().await?;
        Ok((user, pair))
    }

    /// Verify credentials, stamp the login time, and mint a session. The
    /// login-time update and the ledger row commit together; a rejected
    /// login rolls back and mutates nothing.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        fingerprint: &str,
    ) -> Result<Option<(User, TokenPair)>, AccountError> {
        let mut uow = self.db.begin().await?;
        let Some(user) = self.users.authenticate(&mut uow, email, password).await? else {
            return Ok(None);
        };
        let pair = self
            .auth
            .create_token_pair(&mut uow, &user.id, fingerprint)
            .await?;
        uow.commit().await?;
        Ok(Some((user, pair)))
    }

    /// Rotate a refresh handle into a new pair; `None` rejections leave the
    /// presented handle untouched.
    pub async fn refresh(&self, handle: &str) -> Result<Option<TokenPair>, AccountError> {
        let mut uow = self.db.begin().await?;
        match self.auth.refresh_token_pair(&mut uow, handle).await? {
            Some(pair) => {
                uow.commit().await?;
                Ok(Some(pair))
            }
            None => Ok(None),
        }
    }

    /// Revoke an access token and refresh handle together.
    pub async fn logout(&self, access_token: &str, handle: &str) -> Result<bool, AccountError> {
        let mut uow = self.db.begin().await?;
        let revoked = self
            .auth
            .revoke_token_pair(&mut uow, access_token, handle)
            .await?;
        if revoked {
            uow.commit().await?;
        }
        Ok(revoked)
    }

    /// Hot-path validation for authenticated requests; no transaction.
    pub async fn validate_access_token(
        &self,
        token: &str,
    ) -> Result<Option<TokenPayload>, AccountError> {
        Ok(self.auth.validate_access_token(token).await?)
    }

    pub fn database(&self) -> &AccountsDatabase {
        &self.db
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }
}
