//! bcrypt password hashing for the credential store.

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(bcrypt::BcryptError),
    /// The stored value is not a parseable bcrypt hash.
    #[error("malformed password hash: {0}")]
    MalformedHash(bcrypt::BcryptError),
    #[error("password task failed: {0}")]
    Task(String),
}

/// PasswordHasher
///
/// One-way, self-salting adaptive hash. The cost factor is fixed per process
/// (from configuration); hashes produced with another cost still verify because
/// bcrypt embeds the cost in its output.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        bcrypt::hash(plaintext, self.cost).map_err(PasswordError::Hash)
    }

    /// Returns `Ok(false)` on a wrong password; errors only for a malformed stored hash.
    pub fn verify(&self, plaintext: &str, stored: &str) -> Result<bool, PasswordError> {
        bcrypt::verify(plaintext, stored).map_err(PasswordError::MalformedHash)
    }

    /// `hash` on the blocking pool, for use from request handlers.
    pub async fn hash_async(&self, plaintext: &str) -> Result<String, PasswordError> {
        let hasher = *self;
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
    }

    /// `verify` on the blocking pool, for use from request handlers.
    pub async fn verify_async(&self, plaintext: &str, stored: &str) -> Result<bool, PasswordError> {
        let hasher = *self;
        let plaintext = plaintext.to_string();
        let stored = stored.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &stored))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
