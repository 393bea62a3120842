use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, info};

use super::{
    error::AccountError,
    ids::IdGenerator,
    password::CredentialHasher,
    repo::UserRepository,
    repo_types::{PagedResult, User},
};

pub const DEFAULT_ROLE: i32 = 1;

/// Business rules for user accounts. Holds no per-call state, so one instance
/// is shared by every request.
#[derive(Clone)]
pub struct AccountService {
    repo: Arc<dyn UserRepository>,
    ids: Arc<dyn IdGenerator>,
    hasher: Arc<dyn CredentialHasher>,
}

fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

impl AccountService {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        ids: Arc<dyn IdGenerator>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        Self { repo, ids, hasher }
    }

    pub async fn find(&self, identifier: &str) -> Result<User, AccountError> {
        self.repo.find(identifier).await
    }

    /// Create a new account. Server-owned fields supplied by the caller are
    /// overwritten.
    pub async fn store(&self, mut user: User) -> Result<(), AccountError> {
        let plain = user.password.take().unwrap_or_default();
        user.password = Some(self.hash(plain).await?);

        user.id = self.ids.new_id();
        user.role = DEFAULT_ROLE;
        user.is_email_verified = false;
        user.is_active = false;

        let now = now_unix();
        user.active_until = now;
        user.created_at = now;
        user.updated_at = now;

        self.repo.store(&user).await?;
        info!(user_id = %user.id, username = %user.username, "user stored");
        Ok(())
    }

    /// Replace the mutable state of an existing account. A non-empty password
    /// is re-hashed; an empty one keeps the stored hash.
    pub async fn update(&self, id: &str, mut user: User) -> Result<(), AccountError> {
        user.password = match user.password.take().filter(|p| !p.is_empty()) {
            Some(plain) => Some(self.hash(plain).await?),
            None => None,
        };
        user.updated_at = now_unix();

        self.repo.update(id, &user).await?;
        info!(user_id = %id, "user updated");
        Ok(())
    }

    pub async fn find_all(
        &self,
        page: i64,
        limit: i64,
        order_by: &str,
        order_type: &str,
    ) -> Result<PagedResult, AccountError> {
        let result = self.repo.find_all(page, limit, order_by, order_type).await?;
        debug!(
            page = result.page,
            limit = result.limit,
            total = result.total_records,
            "users listed"
        );
        Ok(result)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AccountError> {
        self.repo.delete(id).await?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// Argon2 is CPU bound, keep it off the async workers.
    async fn hash(&self, plain: String) -> Result<String, AccountError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.generate(&plain))
            .await
            .map_err(|e| AccountError::HashingFailure(e.to_string()))?
            .map_err(|e| AccountError::HashingFailure(e.to_string()))
    }
}
