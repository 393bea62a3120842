use std::sync::Arc;

use crate::config::AppConfig;
use crate::db;
use crate::users::{
    ids::UuidGenerator, password::Argon2Hasher, repo::MongoUserRepository,
    services::AccountService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: AccountService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let timeout = config.db.timeout();

        let client = db::connect(&config.db.url, &config.db.name, timeout).await?;
        let repo = MongoUserRepository::new(&client.database(&config.db.name), timeout);
        db::ensure_indexes(repo.collection()).await?;

        let accounts = AccountService::new(
            Arc::new(repo),
            Arc::new(UuidGenerator),
            Arc::new(Argon2Hasher),
        );
        Ok(Self { config, accounts })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::DbConfig;
        use crate::users::memory::InMemoryUserRepository;

        let config = Arc::new(AppConfig {
            service_name: "user-svc-test".into(),
            host: "127.0.0.1".into(),
            port: 0,
            db: DbConfig {
                url: "mongodb://localhost:27017".into(),
                name: "users_test".into(),
                timeout_secs: 5,
            },
        });
        let accounts = AccountService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(UuidGenerator),
            Arc::new(Argon2Hasher),
        );
        Self { config, accounts }
    }
}
