//! OID-to-name resolution backed by a live PostgreSQL connection or a
//! previously generated cache file, implementing `wal_decoder`'s
//! `NameResolver` trait.

pub mod cache;
pub mod connection;
pub mod error;

pub use cache::{CacheFile, CachedResolver};
pub use connection::{ConnParams, PgResolver};
pub use error::Oid2NameError;
