use std::{future::Future, time::Duration};

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Document},
    options::{FindOneOptions, FindOptions},
    Collection, Database,
};
use tracing::{error, warn};

use super::{
    error::AccountError,
    repo_types::{ListQuery, PagedResult, User},
};
use crate::db::USERS_COLLECTION;

/// Persistence port for user documents.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up by id, email or username. The password is never returned.
    async fn find(&self, identifier: &str) -> Result<User, AccountError>;

    async fn store(&self, user: &User) -> Result<(), AccountError>;

    /// Overwrite every mutable field of the user with `id`.
    /// `id` and `created_at` are kept; a `None` password keeps the stored hash.
    async fn update(&self, id: &str, user: &User) -> Result<(), AccountError>;

    async fn find_all(
        &self,
        page: i64,
        limit: i64,
        order_by: &str,
        order_type: &str,
    ) -> Result<PagedResult, AccountError>;

    async fn delete(&self, id: &str) -> Result<(), AccountError>;
}

#[derive(Clone)]
pub struct MongoUserRepository {
    users: Collection<User>,
    timeout: Duration,
}

impl MongoUserRepository {
    pub fn new(db: &Database, timeout: Duration) -> Self {
        Self {
            users: db.collection::<User>(USERS_COLLECTION),
            timeout,
        }
    }

    pub fn collection(&self) -> &Collection<User> {
        &self.users
    }
}

/// Run one storage call under the per-call timeout. Dropping the future on
/// expiry cancels the in-flight operation.
async fn bounded<T, F>(timeout: Duration, op: &'static str, fut: F) -> Result<T, AccountError>
where
    F: Future<Output = mongodb::error::Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => {
            let err = AccountError::from(e);
            if !matches!(err, AccountError::AlreadyExists) {
                error!(error = %err, op, "mongodb call failed");
            }
            Err(err)
        }
        Err(_) => {
            warn!(op, ?timeout, "mongodb call timed out");
            Err(AccountError::Timeout)
        }
    }
}

fn lookup_filter(identifier: &str) -> Document {
    doc! {
        "$or": [
            { "id": identifier },
            { "email": identifier },
            { "username": identifier },
        ]
    }
}

fn mutable_fields(user: &User) -> Result<Document, AccountError> {
    let mut set = bson::to_document(user)
        .map_err(|e| AccountError::StorageFailure(format!("encode user: {e}")))?;
    set.remove("id");
    set.remove("created_at");
    Ok(set)
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn find(&self, identifier: &str) -> Result<User, AccountError> {
        let options = FindOneOptions::builder()
            .projection(doc! { "password": 0 })
            .build();
        bounded(self.timeout, "find", self.users.find_one(lookup_filter(identifier), options))
            .await?
            .ok_or(AccountError::NotFound)
    }

    async fn store(&self, user: &User) -> Result<(), AccountError> {
        bounded(self.timeout, "store", self.users.insert_one(user, None)).await?;
        Ok(())
    }

    async fn update(&self, id: &str, user: &User) -> Result<(), AccountError> {
        let update = doc! { "$set": mutable_fields(user)? };
        let res = bounded(
            self.timeout,
            "update",
            self.users.update_one(doc! { "id": id }, update, None),
        )
        .await?;
        if res.matched_count == 0 {
            return Err(AccountError::NotFound);
        }
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

        let options = FindOptions::builder()
            .projection(doc! { "password": 0 })
            .sort(doc! {
                query.order_by.field(): query.order_type.direction(),
                "id": 1,
            })
            .skip(query.skip())
            .limit(query.limit)
            .build();

        // count and page share one deadline
        let (total, data) = bounded(self.timeout, "find_all", async {
            let total = self.users.count_documents(doc! {}, None).await?;
            let cursor = self.users.find(doc! {}, options).await?;
            let data: Vec<User> = cursor.try_collect().await?;
            Ok::<_, mongodb::error::Error>((total, data))
        })
        .await?;

        Ok(PagedResult::new(data, total as i64, &query))
    }

    async fn delete(&self, id: &str) -> Result<(), AccountError> {
        let res = bounded(
            self.timeout,
            "delete",
            self.users.delete_one(doc! { "id": id }, None),
        )
        .await?;
        if res.deleted_count == 0 {
            return Err(AccountError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_filter_matches_any_unique_key() {
        let filter = lookup_filter("alice");
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 3);
        for (clause, key) in clauses.iter().zip(["id", "email", "username"]) {
            let clause = clause.as_document().unwrap();
            assert_eq!(clause.get_str(key).unwrap(), "alice");
        }
    }

    #[test]
    fn mutable_fields_skip_immutable_keys_and_absent_password() {
        let user = User {
            id: "u1".into(),
            email: "a@b.io".into(),
            username: "a".into(),
            created_at: 10,
            updated_at: 20,
            ..User::default()
        };
        let set = mutable_fields(&user).unwrap();
        assert!(!set.contains_key("id"));
        assert!(!set.contains_key("created_at"));
        assert!(!set.contains_key("password"));
        assert_eq!(set.get_str("email").unwrap(), "a@b.io");
        assert_eq!(set.get_i64("updated_at").unwrap(), 20);
    }

    #[test]
    fn mutable_fields_carry_new_password_hash() {
        let user = User {
            password: Some("$argon2id$hash".into()),
            ..User::default()
        };
        let set = mutable_fields(&user).unwrap();
        assert_eq!(set.get_str("password").unwrap(), "$argon2id$hash");
    }

    #[tokio::test]
    async fn bounded_times_out_stalled_calls() {
        let res = bounded(
            Duration::from_millis(20),
            "stalled",
            std::future::pending::<mongodb::error::Result<()>>(),
        )
        .await;
        assert!(matches!(res, Err(AccountError::Timeout)));
    }

    #[tokio::test]
    async fn bounded_passes_through_results() {
        let ok = bounded(Duration::from_secs(1), "ready", async {
            Ok::<_, mongodb::error::Error>(7)
        })
        .await;
        assert_eq!(ok.unwrap(), 7);
    }
}
