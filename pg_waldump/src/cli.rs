//! Command-line surface (spec §6), mirrored one-to-one onto a `clap` derive
//! struct the way the teacher's binaries define theirs.

use camino::Utf8PathBuf;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "pg_waldump", about = "Render PostgreSQL 8.2-9.2 write-ahead log segments as text")]
pub struct Cli {
    /// Emit only records whose rmid equals N (0..15).
    #[arg(long)]
    pub rmid: Option<u8>,

    /// Emit only records whose xid equals N.
    #[arg(long)]
    pub xid: Option<u32>,

    /// Suppress per-record output; print a per-xid summary at end.
    #[arg(long)]
    pub transactions: bool,

    /// Attempt SQL-shaped reconstruction for inserts/updates (requires name resolution).
    #[arg(long)]
    pub statements: bool,

    /// Suppress per-record output; print rmgr/backup-block statistics at end.
    #[arg(long)]
    pub stats: bool,

    /// Omit timestamps from rendered output (test determinism).
    #[arg(long)]
    pub hide_timestamps: bool,

    /// Enable name resolution via database connection.
    #[arg(long)]
    pub oid2name: bool,

    /// Materialise an OID->name cache file and exit.
    #[arg(long)]
    pub gen_oid2name: bool,

    #[arg(long, default_value = "localhost", env = "PGHOST")]
    pub host: String,

    #[arg(long, default_value_t = 5432, env = "PGPORT")]
    pub port: u16,

    #[arg(long, default_value = "postgres", env = "PGUSER")]
    pub user: String,

    #[arg(long, default_value = "postgres", env = "PGDATABASE")]
    pub dbname: String,

    /// Cache file path: destination for `--gen-oid2name`, source when
    /// `--oid2name` is used without a live connection.
    #[arg(long)]
    pub file: Option<Utf8PathBuf>,

    /// WAL segment files to render.
    pub segments: Vec<Utf8PathBuf>,
}
