//! # Storage Layer
//!
//! Callers talk to storage with hand-written relational statements and `$N`
//! placeholders, as if a SQL server were behind it. There is none: [`DocumentStore`]
//! keeps every table in memory and mirrors the whole set into a single JSON document.
//!
//! ## Statement Handling
//!
//! ```text
//!   "UPDATE stock SET quantite = $1 WHERE id_stock = $2"   [100, 7]
//!                         │
//!                   shape::normalize          lowercase, collapse whitespace
//!                         │
//!                   shape::classify           verb + table + fingerprint → QueryShape
//!                         │
//!               placeholders::resolve         which $N feeds which column
//!                         │
//!                  DocumentStore              mutate TableSet, persist if rows changed
//! ```
//!
//! Shapes outside the recognized set return an empty result from
//! [`DocumentStore::query`]. [`DocumentStore::query_checked`] reports them as
//! [`FermeError::UnrecognizedQuery`](crate::error::FermeError::UnrecognizedQuery).
//!
//! ## Persistence
//!
//! - Every successful mutation rewrites the whole document. No journal, no temp file.
//! - Read-only simulation keeps mutations in memory. The flag is sticky: a query that
//!   sets it leaves it set for later queries.
//! - Save failures are logged and swallowed. Memory stays authoritative.
//! - A missing document is seeded; an unreadable one is replaced by seed data in
//!   memory only.
//!
//! Two processes sharing one file race each other; the last full write wins.
//!
//! ## Backends
//!
//! - [`FsBackend`]: the JSON file on disk.
//! - [`MemBackend`]: a string held in memory, with write-failure simulation for tests.
//!   [`InMemoryStore`] wraps it, with fixtures behind the `test_utils` feature.
//!
//! ## File Format
//!
//! ```text
//! {
//!   "utilisateur": [...],
//!   "culture":     [...],
//!   "parcelle":    [...],
//!   "alerte":      [...],
//!   "intrant":     [...],
//!   "stock":       [...]
//! }
//! ```

pub mod backend;
pub mod document_store;
pub mod fs_backend;
pub mod mem_backend;
pub mod memory;
pub mod placeholders;
pub mod seed;
pub mod shape;

pub use backend::StorageBackend;
pub use document_store::{DocumentStore, QueryOptions, QueryResult, Row};
pub use fs_backend::FsBackend;
pub use mem_backend::MemBackend;
pub use memory::InMemoryStore;
pub use shape::{QueryShape, StockUpdateMode};

/// Store backed by the JSON file on disk.
pub type FileStore = DocumentStore<FsBackend>;
