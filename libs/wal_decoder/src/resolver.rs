//! Name-resolver external collaborator interface (spec §6). The core only
//! ever calls these four operations; `oid2name` supplies a real
//! database-backed implementation, and `NullResolver` is used when
//! `--oid2name` was not requested.

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    pub type_oid: u32,
    pub length: i16,
    pub alignment: u8,
    pub by_value: bool,
}

pub trait NameResolver {
    fn resolve_tablespace(&mut self, oid: u32) -> String;
    fn resolve_database(&mut self, oid: u32) -> String;
    fn resolve_relation(&mut self, oid: u32) -> String;
    /// Attribute list for a relation, in declaration order. `None` if the
    /// relation can't be resolved (unknown without a live connection, or
    /// not found).
    fn attributes(&mut self, relname: &str) -> Option<Vec<AttributeDescriptor>>;
}

/// Used when name resolution is unavailable or disabled: every OID is
/// rendered as its numeric value (spec §3.4: "if the resolver is absent or
/// a lookup fails, the numeric value is rendered instead").
#[derive(Debug, Default)]
pub struct NullResolver;

impl NameResolver for NullResolver {
    fn resolve_tablespace(&mut self, oid: u32) -> String {
        oid.to_string()
    }

    fn resolve_database(&mut self, oid: u32) -> String {
        oid.to_string()
    }

    fn resolve_relation(&mut self, oid: u32) -> String {
        oid.to_string()
    }

    fn attributes(&mut self, _relname: &str) -> Option<Vec<AttributeDescriptor>> {
        None
    }
}

/// A file-node (spec §3.4), rendered through a resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileNode {
    pub spc_node: u32,
    pub db_node: u32,
    pub rel_node: u32,
}

impl FileNode {
    pub fn render(&self, resolver: &mut dyn NameResolver) -> String {
        format!(
            "{}/{}/{}",
            resolver.resolve_tablespace(self.spc_node),
            resolver.resolve_database(self.db_node),
            resolver.resolve_relation(self.rel_node)
        )
    }
}
