use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    error::AccountError,
    repo::UserRepository,
    repo_types::{ListQuery, OrderBy, OrderType, PagedResult, User},
};

/// `UserRepository` over a Vec, with the same unique-key and paging rules as
/// the mongodb collection.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored document, password hash included.
    pub async fn stored(&self, id: &str) -> Option<User> {
        self.users.read().await.iter().find(|u| u.id == id).cloned()
    }
}

fn without_password(user: &User) -> User {
    User {
        password: None,
        ..user.clone()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find(&self, identifier: &str) -> Result<User, AccountError> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.id == identifier || u.email == identifier || u.username == identifier)
            .map(without_password)
            .ok_or(AccountError::NotFound)
    }

    async fn store(&self, user: &User) -> Result<(), AccountError> {
        let mut users = self.users.write().await;
        let taken = users
            .iter()
            .any(|u| u.id == user.id || u.email == user.email || u.username == user.username);
        if taken {
            return Err(AccountError::AlreadyExists);
        }
        users.push(user.clone());
        Ok(())
    }

    async fn update(&self, id: &str, user: &User) -> Result<(), AccountError> {
        let mut users = self.users.write().await;
        let Some(idx) = users.iter().position(|u| u.id == id) else {
            return Err(AccountError::NotFound);
        };
        let taken = users
            .iter()
            .any(|u| u.id != id && (u.email == user.email || u.username == user.username));
        if taken {
            return Err(AccountError::AlreadyExists);
        }

        let current = &mut users[idx];
        current.email = user.email.clone();
        current.username = user.username.clone();
        if let Some(hash) = &user.password {
            current.password = Some(hash.clone());
        }
        current.role = user.role;
        current.is_email_verified = user.is_email_verified;
        current.is_active = user.is_active;
        current.active_until = user.active_until;
        current.updated_at = user.updated_at;
        Ok(())
    }

    async fn find_all(
        &self,
        page: i64,
        limit: i64,
        order_by: &str,
        order_type: &str,
    ) -> Result<PagedResult, AccountError> {
        let query = ListQuery::normalize(page, limit, order_by, order_type);
        let mut all: Vec<User> = self.users.read().await.iter().map(without_password).collect();

        all.sort_by(|a, b| {
            let (ka, kb) = match query.order_by {
                OrderBy::CreatedAt => (a.created_at, b.created_at),
                OrderBy::UpdatedAt => (a.updated_at, b.updated_at),
            };
            let primary = match query.order_type {
                OrderType::Asc => ka.cmp(&kb),
                OrderType::Desc => kb.cmp(&ka),
            };
            primary.then_with(|| a.id.cmp(&b.id))
        });

        let total = all.len() as i64;
        let data = all
            .into_iter()
            .skip(query.skip() as usize)
            .take(query.limit as usize)
            .collect();
        Ok(PagedResult::new(data, total, &query))
    }

    async fn delete(&self, id: &str) -> Result<(), AccountError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(AccountError::NotFound);
        }
        Ok(())
    }
}
