use crate::{
    models::{NewUser, Role},
    password::{PasswordError, PasswordHasher},
    repository::{RepositoryError, RepositoryState},
};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// ensure_admin
///
/// Creates the configured administrator account unless the username already
/// exists. Returns whether an account was created. The password is hashed
/// before it reaches the store and is never logged.
pub async fn ensure_admin(
    repo: &RepositoryState,
    hasher: PasswordHasher,
    username: &str,
    password: &str,
) -> Result<bool, BootstrapError> {
    if repo.find_user(username).await?.is_some() {
        tracing::info!(%username, "admin account already present");
        return Ok(false);
    }

    let password_hash = hasher.hash_async(password).await?;

    match repo
        .create_user(NewUser {
            username: username.to_string(),
            password_hash,
            role: Role::Admin,
        })
        .await
    {
        Ok(_) => {
            tracing::info!(%username, "admin account created");
            Ok(true)
        }
        // Another instance won the race.
        Err(RepositoryError::Duplicate(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
