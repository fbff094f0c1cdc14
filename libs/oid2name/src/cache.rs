//! `--gen-oid2name` materialises a resolver's lookups into a flat file so
//! later runs (possibly offline, against an archived WAL set) can resolve
//! names without a live connection.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use wal_decoder::{AttributeDescriptor, NameResolver};

use crate::connection::{ConnParams, PgResolver};
use crate::error::Oid2NameError;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CacheFile {
    pub tablespaces: HashMap<u32, String>,
    pub databases: HashMap<u32, String>,
    pub relations: HashMap<u32, String>,
    pub attributes: HashMap<String, Vec<AttributeDescriptor>>,
}

/// Connects once, walks every tablespace/database/relation the server
/// knows about plus each relation's attribute list, and returns the
/// gathered cache (spec §6's `--gen-oid2name`).
pub fn generate(params: &ConnParams) -> Result<CacheFile, Oid2NameError> {
    let mut resolver = PgResolver::connect(params)?;
    let mut cache = CacheFile::default();

    for (oid, name) in resolver.raw_query_oid_name_pairs("SELECT oid, spcname FROM pg_tablespace")? {
        cache.tablespaces.insert(oid, name);
    }
    for (oid, name) in resolver.raw_query_oid_name_pairs("SELECT oid, datname FROM pg_database")? {
        cache.databases.insert(oid, name);
    }
    for (oid, name) in
        resolver.raw_query_oid_name_pairs("SELECT oid, relname FROM pg_class WHERE relkind IN ('r', 'i')")?
    {
        cache.relations.insert(oid, name.clone());
        if let Some(attrs) = resolver.attributes(&name) {
            cache.attributes.insert(name, attrs);
        }
    }
    Ok(cache)
}

pub fn write(cache: &CacheFile, path: &Path) -> Result<(), Oid2NameError> {
    let json = serde_json::to_string_pretty(cache)?;
    fs::write(path, json).map_err(|source| Oid2NameError::CacheWrite {
        path: path.display().to_string(),
        source,
    })
}

pub fn load(path: &Path) -> Result<CacheFile, Oid2NameError> {
    let contents = fs::read_to_string(path).map_err(|source| Oid2NameError::CacheRead {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&contents)?)
}

/// Offline `NameResolver` backed by a previously generated cache file; a
/// miss falls back to the numeric OID like `NullResolver`.
pub struct CachedResolver {
    cache: CacheFile,
}

impl CachedResolver {
    pub fn new(cache: CacheFile) -> Self {
        CachedResolver { cache }
    }
}

impl NameResolver for CachedResolver {
    fn resolve_tablespace(&mut self, oid: u32) -> String {
        self.cache.tablespaces.get(&oid).cloned().unwrap_or_else(|| oid.to_string())
    }

    fn resolve_database(&mut self, oid: u32) -> String {
        self.cache.databases.get(&oid).cloned().unwrap_or_else(|| oid.to_string())
    }

    fn resolve_relation(&mut self, oid: u32) -> String {
        self.cache.relations.get(&oid).cloned().unwrap_or_else(|| oid.to_string())
    }

    fn attributes(&mut self, relname: &str) -> Option<Vec<AttributeDescriptor>> {
        self.cache.attributes.get(relname).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_resolver_falls_back_to_numeric_oid() {
        let mut resolver = CachedResolver::new(CacheFile::default());
        assert_eq!(resolver.resolve_tablespace(1663), "1663");
    }

    #[test]
    fn cached_resolver_returns_cached_name() {
        let mut cache = CacheFile::default();
        cache.databases.insert(5, "postgres".to_string());
        let mut resolver = CachedResolver::new(cache);
        assert_eq!(resolver.resolve_database(5), "postgres");
    }

    #[test]
    fn round_trips_through_json() {
        let mut cache = CacheFile::default();
        cache.relations.insert(16384, "accounts".to_string());
        let json = serde_json::to_string(&cache).unwrap();
        let restored: CacheFile = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.relations.get(&16384).unwrap(), "accounts");
    }
}
