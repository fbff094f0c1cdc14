//! Stateful WAL reassembly and resource-manager decoding built on top of
//! `postgres_ffi`'s byte-level structs. This crate owns everything that
//! needs to track state across records or pages: the page reassembler,
//! CRC/length-closure validation, transaction status aggregation, rmgr
//! statistics, and the per-rmgr payload decoders.

pub mod backup_blocks;
pub mod error;
pub mod reader;
pub mod resolver;
pub mod rmgr;
pub mod stats;
pub mod transactions;
pub mod tuple;

pub use backup_blocks::{BackupBlock, BackupBlockWalker};
pub use error::{DriverError, FormatError};
pub use reader::{DecodedRawRecord, ReadOutcome, WalReader};
pub use resolver::{AttributeDescriptor, FileNode, NameResolver, NullResolver};
pub use stats::RmgrStats;
pub use transactions::{TransactionTracker, TxnStatus};
