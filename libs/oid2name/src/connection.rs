//! Live database-backed `NameResolver` (spec §6's name-resolver interface),
//! grounded on the original tool's `DBConnect` / `getSpaceName` / `getDbName`
//! / `getRelName` / `relid2attr_*` routines. Each OID is looked up at most
//! once per connection and cached (spec §5's external-resource policy).

use std::collections::HashMap;

use postgres::{Client, NoTls};

use wal_decoder::{AttributeDescriptor, NameResolver};

use crate::error::Oid2NameError;

#[derive(Debug, Clone)]
pub struct ConnParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub dbname: String,
}

impl ConnParams {
    fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} dbname={}",
            self.host, self.port, self.user, self.dbname
        )
    }
}

fn attalign_to_bytes(attalign: i8) -> u8 {
    match attalign as u8 as char {
        's' => 2,
        'i' => 4,
        'd' => 8,
        _ => 1, // 'c' and anything unrecognized: byte alignment
    }
}

pub struct PgResolver {
    client: Client,
    tablespaces: HashMap<u32, String>,
    databases: HashMap<u32, String>,
    relations: HashMap<u32, String>,
    attributes: HashMap<String, Vec<AttributeDescriptor>>,
}

impl PgResolver {
    /// Runs a `SELECT oid, name_column FROM ...` query and collects the
    /// pairs; used by `--gen-oid2name` to walk a whole catalog at once.
    pub(crate) fn raw_query_oid_name_pairs(&mut self, query: &str) -> Result<Vec<(u32, String)>, Oid2NameError> {
        let rows = self.client.query(query, &[]).map_err(Oid2NameError::Query)?;
        Ok(rows.iter().map(|row| (row.get::<_, u32>(0), row.get(1))).collect())
    }

    pub fn connect(params: &ConnParams) -> Result<Self, Oid2NameError> {
        let client =
            Client::connect(&params.connection_string(), NoTls).map_err(Oid2NameError::Connect)?;
        Ok(PgResolver {
            client,
            tablespaces: HashMap::new(),
            databases: HashMap::new(),
            relations: HashMap::new(),
            attributes: HashMap::new(),
        })
    }
}

impl NameResolver for PgResolver {
    fn resolve_tablespace(&mut self, oid: u32) -> String {
        if let Some(name) = self.tablespaces.get(&oid) {
            return name.clone();
        }
        match self
            .client
            .query_opt("SELECT spcname FROM pg_tablespace WHERE oid = $1", &[&oid])
        {
            Ok(Some(row)) => {
                let name: String = row.get(0);
                self.tablespaces.insert(oid, name.clone());
                name
            }
            _ => oid.to_string(),
        }
    }

    fn resolve_database(&mut self, oid: u32) -> String {
        if let Some(name) = self.databases.get(&oid) {
            return name.clone();
        }
        match self
            .client
            .query_opt("SELECT datname FROM pg_database WHERE oid = $1", &[&oid])
        {
            Ok(Some(row)) => {
                let name: String = row.get(0);
                self.databases.insert(oid, name.clone());
                name
            }
            _ => oid.to_string(),
        }
    }

    fn resolve_relation(&mut self, oid: u32) -> String {
        if let Some(name) = self.relations.get(&oid) {
            return name.clone();
        }
        match self
            .client
            .query_opt("SELECT relname FROM pg_class WHERE oid = $1", &[&oid])
        {
            Ok(Some(row)) => {
                let name: String = row.get(0);
                self.relations.insert(oid, name.clone());
                name
            }
            _ => oid.to_string(),
        }
    }

    fn attributes(&mut self, relname: &str) -> Option<Vec<AttributeDescriptor>> {
        if let Some(attrs) = self.attributes.get(relname) {
            return Some(attrs.clone());
        }
        let rows = self
            .client
            .query(
                "SELECT a.attname, a.atttypid, a.attlen, a.attalign, a.attbyval \
                 FROM pg_attribute a JOIN pg_class c ON a.attrelid = c.oid \
                 WHERE c.relname = $1 AND a.attnum > 0 AND NOT a.attisdropped \
                 ORDER BY a.attnum",
                &[&relname],
            )
            .ok()?;
        if rows.is_empty() {
            return None;
        }
        let attrs: Vec<AttributeDescriptor> = rows
            .iter()
            .map(|row| {
                let attalign: i8 = row.get(3);
                AttributeDescriptor {
                    name: row.get(0),
                    type_oid: row.get::<_, u32>(1),
                    length: row.get::<_, i16>(2),
                    alignment: attalign_to_bytes(attalign),
                    by_value: row.get(4),
                }
            })
            .collect();
        self.attributes.insert(relname.to_string(), attrs.clone());
        Some(attrs)
    }
}
