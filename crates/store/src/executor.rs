//! The query executor seam
//!
//! Tools talk to the store only through [`QueryExecutor`]. The `try_*` methods
//! report failures as typed errors; `fetch_all` / `fetch_one` keep the
//! fail-silent contract and collapse every failure to an empty result.

use async_trait::async_trait;

use crate::error::Result;
use crate::record::{Param, Record};

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a query and return every row
    async fn try_fetch_all(&self, sql: &str, params: &[Param]) -> Result<Vec<Record>>;

    /// Run a query and return its first row, if any
    async fn try_fetch_one(&self, sql: &str, params: &[Param]) -> Result<Option<Record>>;

    /// Whether a connection is currently available
    async fn is_connected(&self) -> bool;

    /// Like [`QueryExecutor::try_fetch_all`], but any failure yields an empty list.
    async fn fetch_all(&self, sql: &str, params: &[Param]) -> Vec<Record> {
        match self.try_fetch_all(sql, params).await {
            Ok(rows) => {
                tracing::debug!("Query returned {} rows", rows.len());
                rows
            }
            Err(e) => {
                tracing::error!(error = %e, "Database query failed, returning empty list");
                Vec::new()
            }
        }
    }

    /// Like [`QueryExecutor::try_fetch_one`], but any failure yields `None`.
    async fn fetch_one(&self, sql: &str, params: &[Param]) -> Option<Record> {
        match self.try_fetch_one(sql, params).await {
            Ok(row) => row,
            Err(e) => {
                tracing::error!(error = %e, "Database query failed, returning no row");
                None
            }
        }
    }
}

#[async_trait]
impl<T: QueryExecutor + ?Sized> QueryExecutor for std::sync::Arc<T> {
    async fn try_fetch_all(&self, sql: &str, params: &[Param]) -> Result<Vec<Record>> {
        (**self).try_fetch_all(sql, params).await
    }

    async fn try_fetch_one(&self, sql: &str, params: &[Param]) -> Result<Option<Record>> {
        (**self).try_fetch_one(sql, params).await
    }

    async fn is_connected(&self) -> bool {
        (**self).is_connected().await
    }
}
