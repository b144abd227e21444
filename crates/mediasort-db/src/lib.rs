//! Mediasort-DB: durable queue of assignment batches.
//!
//! Batches are stored in SQLite through an r2d2 pool. Each row keeps the
//! directory, the serialized `{path, assignment}` items, a status, and the
//! creation time.
//!
//! # Modules
//!
//! - `migrations` - Embedded schema migrations
//! - `pool` - Connection pool management
//! - `models` - [`SeriesBatch`](models::SeriesBatch) and friends
//! - `queries` - Batch CRUD
//!
//! # Example
//!
//! ```
//! use mediasort_db::pool::{get_conn, init_memory_pool};
//! use mediasort_db::queries::batches;
//!
//! let pool = init_memory_pool().unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let batch = batches::create_batch(&conn, "Show", Vec::new()).unwrap();
//! assert_eq!(batches::get_batch(&conn, batch.id).unwrap().directory, "Show");
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
