//! User service: registration, credential checks, and profile state
//! transitions. Every method operates on a caller-supplied unit of work so
//! the caller decides the transaction boundary.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::auth::password::{PasswordHashError, PasswordHasher};
use crate::clock::Clock;
use crate::storage::{DatabaseError, UnitOfWork, User};

/// Registration input.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: Option<String>,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("password hashing error: {0}")]
    PasswordHash(#[from] PasswordHashError),

    #[error("email already registered")]
    EmailTaken,

    #[error("username already taken")]
    UsernameTaken,

    #[error("user not found")]
    NotFound,
}

pub struct UserService {
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(hasher: Arc<dyn PasswordHasher>, clock: Arc<dyn Clock>) -> Self {
        Self { hasher, clock }
    }

    /// Create a user with a hashed password. Email and username must be
    /// unique; collisions are domain errors, distinct from invalid
    /// credentials.
    #[instrument(skip_all, fields(email = %new_user.email))]
    pub async fn register(
        &self,
        uow: &mut UnitOfWork,
        new_user: NewUser,
    ) -> Result<User, UserError> {
        if uow.get_user_by_email(&new_user.email).await?.is_some() {
            return Err(UserError::EmailTaken);
        }
        if let Some(username) = &new_user.username {
            if uow.get_user_by_username(username).await?.is_some() {
                return Err(UserError::UsernameTaken);
            }
        }

        let password_hash = self.hasher.hash(&new_user.password)?;
        let user = User::new(
            new_user.first_name,
            new_user.last_name,
            new_user.email,
            new_user.username,
            password_hash,
            self.clock.now(),
        );
        uow.add_user(&user).await?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check credentials; on success stamp the login time and return the
    /// user. Unknown email, wrong password, and deactivated accounts all
    /// come back as `None`, indistinguishable to the caller.
    pub async fn authenticate(
        &self,
        uow: &mut UnitOfWork,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, UserError> {
        let Some(mut user) = uow.get_user_by_email(email).await? else {
            return Ok(None);
        };
        if !user.is_active {
            return Ok(None);
        }
        if !self.hasher.verify(password, &user.password_hash)? {
            return Ok(None);
        }

        user.record_login(self.clock.now());
        uow.update_user(&user).await?;
        Ok(Some(user))
    }

    pub async fn change_password(
        &self,
        uow: &mut UnitOfWork,
        user_id: &str,
        new_password: &str,
    ) -> Result<(), UserError> {
        let mut user = uow
            .get_user_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)?;
        user.set_password_hash(self.hasher.hash(new_password)?, self.clock.now());
        uow.update_user(&user).await?;
        Ok(())
    }

    pub async fn activate_user(
        &self,
        uow: &mut UnitOfWork,
        user_id: &str,
    ) -> Result<(), UserError> {
        let mut user = uow
            .get_user_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)?;
        user.activate(self.clock.now());
        uow.update_user(&user).await?;
        Ok(())
    }

    pub async fn deactivate_user(
        &self,
        uow: &mut UnitOfWork,
        user_id: &str,
    ) -> Result<(), UserError> {
        let mut user = uow
            .get_user_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)?;
        user.deactivate(self.clock.now());
        uow.update_user(&user).await?;
        Ok(())
    }

    pub async fn verify_email(
        &self,
        uow: &mut UnitOfWork,
        user_id: &str,
    ) -> Result<(), UserError> {
        let mut user = uow
            .get_user_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)?;
        user.verify_email(self.clock.now());
        uow.update_user(&user).await?;
        Ok(())
    }

    pub async fn remove_user(
        &self,
        uow: &mut UnitOfWork,
        user_id: &str,
    ) -> Result<(), UserError> {
        if !uow.remove_user(user_id).await? {
            return Err(UserError::NotFound);
        }
        info!(user_id, "user removed");
        Ok(())
    }

    pub async fn get_user_by_id(
        &self,
        uow: &mut UnitOfWork,
        user_id: &str,
    ) -> Result<Option<User>, UserError> {
        Ok(uow.get_user_by_id(user_id).await?)
    }

    pub async fn get_user_by_email(
        &self,
        uow: &mut UnitOfWork,
        email: &str,
    ) -> Result<Option<User>, UserError> {
        Ok(uow.get_user_by_email(email).await?)
    }

    pub async fn get_user_by_username(
        &self,
        uow: &mut UnitOfWork,
        username: &str,
    ) -> Result<Option<User>, UserError> {
        Ok(uow.get_user_by_username(username).await?)
    }

    pub async fn list_users(
        &self,
        uow: &mut UnitOfWork,
        only_active: bool,
    ) -> Result<Vec<User>, UserError> {
        Ok(uow.list_users(only_active).await?)
    }
}
