//! Domain model for captured notes.
//!
//! # Responsibility
//! - Define the canonical note record and the PARA bucket taxonomy.
//! - Keep write-side drafts and patches separate from the persisted shape.
//!
//! # Invariants
//! - Every note is identified by a storage-assigned integer id.
//! - Every note is filed under exactly one `ParaBucket`.

pub mod bucket;
pub mod note;
