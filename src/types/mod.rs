//! This module defines the core, strongly-typed data representations used
//! throughout the ndpack loading and array pipeline.
//!
//! It currently includes the canonical `DType` enum which replaces fragile
//! string-based element-type tags with a safe, serializable enum, plus the
//! `StorageKind` enum describing the in-memory buffer an element type uses.

pub mod dtype;

// Re-export the main type(s) for easier access.
pub use dtype::{DType, StorageKind};
