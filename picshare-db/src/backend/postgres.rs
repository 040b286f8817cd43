//! PostgreSQL backend
//!
//! Documents live in JSONB columns. A "database" maps to a PostgreSQL
//! schema and a "table" to a table inside it:
//!
//! ```text
//! <schema>.<table> (id UUID PRIMARY KEY, doc JSONB NOT NULL)
//! ```
//!
//! Handles are connections checked out of a `PgPool`; closing one returns
//! it to the pool.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::{Backend, InsertOutcome};
use crate::config::DbConfig;
use crate::error::{DbError, Result};
use crate::model::{with_id, Document};

/// PostgreSQL backend over a shared connection pool
#[derive(Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Build a pool from configuration without connecting yet.
    ///
    /// Connections are opened on first checkout, so an unreachable server
    /// surfaces as a transport error on `connect()`, not at start-up.
    pub fn connect_lazy(config: &DbConfig) -> Result<Self> {
        let options = match &config.url {
            Some(url) => url.parse::<PgConnectOptions>()?,
            None => {
                let mut options = PgConnectOptions::new()
                    .host(&config.host)
                    .port(config.port);
                if let Some(user) = &config.user {
                    options = options.username(user);
                }
                if let Some(password) = &config.password {
                    options = options.password(password);
                }
                options
            }
        };

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.connect_timeout_ms))
            .connect_lazy_with(options);

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Quote an identifier for interpolation into DDL.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn qualified(db: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(db), quote_ident(table))
}

/// SQLSTATE raised when a bigint computation leaves its range
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

#[async_trait]
impl Backend for PostgresBackend {
    type Handle = PoolConnection<Postgres>;

    async fn open(&self) -> Result<Self::Handle> {
        Ok(self.pool.acquire().await?)
    }

    async fn close(&self, handle: Self::Handle) -> Result<()> {
        // Dropping a pooled connection hands it back to the pool
        drop(handle);
        Ok(())
    }

    async fn list_databases(&self, handle: &mut Self::Handle) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT schema_name::text FROM information_schema.schemata",
        )
        .fetch_all(&mut **handle)
        .await?;
        Ok(names)
    }

    async fn create_database(&self, handle: &mut Self::Handle, name: &str) -> Result<()> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(name)))
            .execute(&mut **handle)
            .await?;
        Ok(())
    }

    async fn list_tables(&self, handle: &mut Self::Handle, db: &str) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT table_name::text FROM information_schema.tables WHERE table_schema = $1",
        )
        .bind(db)
        .fetch_all(&mut **handle)
        .await?;
        Ok(names)
    }

    async fn create_table(&self, handle: &mut Self::Handle, db: &str, table: &str) -> Result<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                doc JSONB NOT NULL DEFAULT '{{}}'::jsonb
            )
            "#,
            qualified(db, table)
        ))
        .execute(&mut **handle)
        .await?;
        Ok(())
    }

    async fn insert(
        &self,
        handle: &mut Self::Handle,
        db: &str,
        table: &str,
        doc: Document,
    ) -> Result<InsertOutcome> {
        let result = sqlx::query_scalar::<_, String>(&format!(
            "INSERT INTO {} (doc) VALUES ($1) RETURNING id::text",
            qualified(db, table)
        ))
        .bind(Json(doc))
        .fetch_one(&mut **handle)
        .await;

        match result {
            Ok(key) => Ok(InsertOutcome::inserted(key)),
            // Refusals by the server are part of the outcome, not a transport failure
            Err(sqlx::Error::Database(e)) => Ok(InsertOutcome::refused(e.message())),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(
        &self,
        handle: &mut Self::Handle,
        db: &str,
        table: &str,
        id: &str,
    ) -> Result<Option<Document>> {
        // Keys are UUIDs; anything else cannot name a stored document
        let Ok(key) = Uuid::parse_str(id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, (String, Json<Document>)>(&format!(
            "SELECT id::text, doc FROM {} WHERE id = $1",
            qualified(db, table)
        ))
        .bind(key)
        .fetch_optional(&mut **handle)
        .await?;

        Ok(row.map(|(id, Json(doc))| with_id(doc, id)))
    }

    async fn increment(
        &self,
        handle: &mut Self::Handle,
        db: &str,
        table: &str,
        id: &str,
        field: &str,
    ) -> Result<Option<Document>> {
        let Ok(key) = Uuid::parse_str(id) else {
            return Ok(None);
        };

        // Single-statement read-modify-write; the row lock makes it atomic
        let row = sqlx::query_as::<_, (String, Json<Document>)>(&format!(
            r#"
            UPDATE {}
            SET doc = jsonb_set(doc, ARRAY[$2::text], to_jsonb(COALESCE((doc->>($2::text))::bigint, 0) + 1))
            WHERE id = $1
            RETURNING id::text, doc
            "#,
            qualified(db, table)
        ))
        .bind(key)
        .bind(field)
        .fetch_optional(&mut **handle)
        .await;

        match row {
            Ok(row) => Ok(row.map(|(id, Json(doc))| with_id(doc, id))),
            Err(sqlx::Error::Database(e))
                if e.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE) =>
            {
                Err(DbError::overflow(id, field))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
