//! Read-only access to the team skills database
//!
//! The store exposes one seam, [`QueryExecutor`], implemented by the pooled
//! [`Database`] handle. Rows come back as [`Record`]s and decode into typed
//! structs with serde.
//!
//! # Example
//!
//! ```ignore
//! use teamskills_core::DatabaseConfig;
//! use teamskills_store::{Database, QueryExecutor};
//!
//! let db = Database::new(&DatabaseConfig::default());
//! db.connect().await?;
//! let rows = db.fetch_all("SELECT name FROM skills ORDER BY name", &[]).await;
//! for row in rows {
//!     println!("{:?}", row.get("name"));
//! }
//! ```

mod database;
mod error;
mod executor;
mod functions;
mod migration;
mod record;
pub mod schema;

pub use database::Database;
pub use error::{Error, Result};
pub use executor::QueryExecutor;
pub use functions::UNICODE_LOWER;
pub use migration::{MigrationManager, bootstrap};
pub use record::{Param, Record, decode_all};
