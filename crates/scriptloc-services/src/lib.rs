//! Batch operations over a tree of NPC scripts.
//! Thin layer the CLI calls into: every operation walks files, handles each one
//! in isolation and returns a serializable summary.

pub mod convert;
pub mod header;
pub mod reconcile;
pub mod sync;
pub mod walk;

mod tally;

pub use convert::{
    convert, decode_gbk, encode_gbk, encoded_path, looks_legacy_encoded, ConvertOptions, Encoded,
    UnmappablePolicy, DEFAULT_ENCODED_SUFFIX, DEFAULT_PLACEHOLDER,
};
pub use header::insert_translated_by_header;
pub use reconcile::{reconcile, ReconcileOptions, DEFAULT_MARKER};
pub use scriptloc_core::Result;
pub use sync::{sync, SyncOptions};
pub use walk::{walk, FileFilter, Walk};
