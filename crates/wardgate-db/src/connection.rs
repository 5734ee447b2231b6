//! Opening the Wardgate store.
//!
//! The endpoint URL picks the engine: `ws://host:port` for a SurrealDB
//! server, `mem://` for an embedded in-memory store. Opening a store
//! always leaves the schema migrated.

use std::fmt;

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::repository::{SurrealAccountRepository, SurrealStore};
use crate::schema::run_migrations;

/// Where the store lives and how to sign in to it.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Endpoint URL, e.g. `ws://127.0.0.1:8000` or `mem://`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root credentials. Ignored by embedded engines.
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8000".into(),
            namespace: "wardgate".into(),
            database: "clinic".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// An embedded in-memory store.
    pub fn in_memory() -> Self {
        Self {
            url: "mem://".into(),
            ..Self::default()
        }
    }

    fn is_embedded(&self) -> bool {
        self.url.starts_with("mem:")
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &self.url)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A migrated Wardgate store.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Any>,
}

impl DbManager {
    /// Connect, sign in (server engines only), select the namespace and
    /// database, then apply pending migrations.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "opening store"
        );
        let fail = |stage: &'static str| {
            let url = config.url.clone();
            move |source| DbError::Connect { url, stage, source }
        };

        let db = any::connect(config.url.as_str())
            .await
            .map_err(fail("connect"))?;

        if !config.is_embedded() {
            db.signin(Root {
                username: config.username.clone(),
                password: config.password.clone(),
            })
            .await
            .map_err(fail("sign in"))?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(fail("select namespace"))?;

        run_migrations(&db).await?;
        info!("store ready");

        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<Any> {
        &self.db
    }

    /// Hospital-scoped repositories over this store.
    pub fn records(&self) -> SurrealStore<Any> {
        SurrealStore::new(self.db.clone())
    }

    /// Account repository hashing with `pepper`, if set.
    pub fn accounts(&self, pepper: Option<&str>) -> SurrealAccountRepository<Any> {
        match pepper {
            Some(pepper) => SurrealAccountRepository::with_pepper(self.db.clone(), pepper.into()),
            None => SurrealAccountRepository::new(self.db.clone()),
        }
    }
}
