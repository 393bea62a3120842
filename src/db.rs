use std::time::Duration;

use anyhow::Context;
use mongodb::{
    bson::doc,
    options::{ClientOptions, IndexOptions},
    Client, Collection, IndexModel,
};

use crate::users::repo_types::User;

pub const USERS_COLLECTION: &str = "users";

/// Open a client and make sure the server answers before we take traffic.
pub async fn connect(url: &str, db_name: &str, timeout: Duration) -> anyhow::Result<Client> {
    let mut options = ClientOptions::parse(url)
        .await
        .context("parse mongodb url")?;
    options.connect_timeout = Some(timeout);
    options.server_selection_timeout = Some(timeout);

    let client = Client::with_options(options).context("build mongodb client")?;

    tokio::time::timeout(
        timeout,
        client.database(db_name).run_command(doc! { "ping": 1 }, None),
    )
    .await
    .context("mongodb ping timed out")?
    .context("mongodb ping")?;

    tracing::info!(db = %db_name, "connected to mongodb");
    Ok(client)
}

/// Unique indexes on every lookup key. Safe to run on each startup.
pub async fn ensure_indexes(users: &Collection<User>) -> anyhow::Result<()> {
    let models = ["id", "email", "username"]
        .into_iter()
        .map(|key| {
            IndexModel::builder()
                .keys(doc! { key: 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build()
        })
        .collect::<Vec<_>>();

    users
        .create_indexes(models, None)
        .await
        .context("create unique user indexes")?;
    Ok(())
}
