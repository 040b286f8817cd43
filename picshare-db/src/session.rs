//! Store sessions: connection lifecycle and image operations
//!
//! A `Db` owns at most one backend handle. It starts disconnected;
//! `connect()` acquires a handle and provisions the schema, `disconnect()`
//! releases it. Image operations refuse to run without a handle and never
//! touch the backend in that case.
//!
//! Sessions are cheap and meant to be opened per request (see
//! [`StoreProvider`](crate::StoreProvider)), so concurrent requests never
//! share a handle.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::backend::Backend;
use crate::config::SessionOptions;
use crate::error::{DbError, Result};
use crate::model::{Image, LIKES_FIELD};
use crate::provision::{ensure_schema, ProvisionReport, IMAGES};

/// Run `fut`, failing with [`DbError::Timeout`] if it exceeds `limit`.
pub(crate) async fn bounded<T, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(DbError::Timeout {
            operation,
            millis: limit.as_millis() as u64,
        }),
    }
}

/// The data access contract: connection lifecycle plus the three image
/// operations.
#[async_trait]
pub trait ImageStore: Send {
    /// Acquire a handle (or keep the current one) and provision the schema.
    async fn connect(&mut self) -> Result<ProvisionReport>;

    /// Release the handle. Fails with `NotConnected` if there is none.
    async fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Store a new image; assigns `createdAt` and `id`.
    async fn save_image(&mut self, image: Image) -> Result<Image>;

    async fn get_image(&mut self, id: &str) -> Result<Image>;

    /// Add one like and return the updated image.
    async fn like_image(&mut self, id: &str) -> Result<Image>;
}

/// Connection manager over a [`Backend`]
pub struct Db<B: Backend> {
    backend: B,
    options: SessionOptions,
    handle: Option<B::Handle>,
}

impl<B: Backend> Db<B> {
    /// Create a disconnected session.
    pub fn new(backend: B, options: SessionOptions) -> Self {
        Self {
            backend,
            options,
            handle: None,
        }
    }
}

#[async_trait]
impl<B: Backend> ImageStore for Db<B> {
    async fn connect(&mut self) -> Result<ProvisionReport> {
        let mut handle = match self.handle.take() {
            Some(handle) => handle,
            None => {
                bounded("connect", self.options.connect_timeout, self.backend.open()).await?
            }
        };

        let provisioned = ensure_schema(
            &self.backend,
            &mut handle,
            &self.options.database,
            self.options.operation_timeout,
        )
        .await;

        match provisioned {
            Ok(report) => {
                self.handle = Some(handle);
                tracing::debug!(backend = self.backend.name(), "Connected");
                Ok(report)
            }
            Err(e) => {
                // Leave the session disconnected; the close result is secondary
                if let Err(close_err) = self.backend.close(handle).await {
                    tracing::warn!(error = %close_err, "Failed to release handle after provisioning error");
                }
                Err(e)
            }
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        let handle = self.handle.take().ok_or(DbError::NotConnected)?;
        bounded(
            "disconnect",
            self.options.operation_timeout,
            self.backend.close(handle),
        )
        .await?;
        tracing::debug!(backend = self.backend.name(), "Disconnected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    async fn save_image(&mut self, mut image: Image) -> Result<Image> {
        let Self {
            backend,
            options,
            handle,
        } = self;
        let handle = handle.as_mut().ok_or(DbError::NotConnected)?;

        image.lift_server_fields();
        image.id = None;
        image.created_at = Some(Utc::now());
        let doc = image.to_document()?;

        let outcome = bounded(
            "insert",
            options.operation_timeout,
            backend.insert(handle, &options.database, IMAGES, doc),
        )
        .await?;
        if outcome.errors > 0 {
            return Err(DbError::Insert(
                outcome
                    .first_error
                    .unwrap_or_else(|| "insert failed".to_string()),
            ));
        }

        let key = outcome
            .generated_keys
            .into_iter()
            .next()
            .ok_or_else(|| DbError::Insert("store returned no generated key".to_string()))?;
        image.id = Some(key);
        Ok(image)
    }

    async fn get_image(&mut self, id: &str) -> Result<Image> {
        let Self {
            backend,
            options,
            handle,
        } = self;
        let handle = handle.as_mut().ok_or(DbError::NotConnected)?;

        let doc = bounded(
            "get",
            options.operation_timeout,
            backend.get(handle, &options.database, IMAGES, id),
        )
        .await?
        .ok_or_else(|| DbError::not_found(id))?;
        Image::from_document(doc)
    }

    async fn like_image(&mut self, id: &str) -> Result<Image> {
        let Self {
            backend,
            options,
            handle,
        } = self;
        let handle = handle.as_mut().ok_or(DbError::NotConnected)?;

        let doc = bounded(
            "update",
            options.operation_timeout,
            backend.increment(handle, &options.database, IMAGES, id, LIKES_FIELD),
        )
        .await?
        .ok_or_else(|| DbError::not_found(id))?;
        Image::from_document(doc)
    }
}
