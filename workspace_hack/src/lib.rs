//! Every workspace crate depends on this one so `cargo` builds the shared
//! dependency graph with one unified feature set instead of rebuilding it
//! per-crate. Generated/maintained by `cargo hakari`; nothing to see here.
