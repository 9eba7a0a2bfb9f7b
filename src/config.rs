// In: src/config.rs

//! The single source of truth for all ndpack load-time configuration.
//!
//! This module defines the `LoadOptions` struct, which is designed to be
//! created once at the application boundary (e.g., from a user's config file)
//! and then passed explicitly to the parsing entry points. There is no hidden
//! per-parser state: a parse call is a pure function of its bytes and its
//! options value.

use serde::{Deserialize, Serialize};

//==================================================================================
// I. Load Options
//==================================================================================

/// Options governing how binary array payloads are decoded.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LoadOptions {
    /// If true, half-precision (`float16`) payloads are expanded to `float32`
    /// storage as they are decoded. When false, the raw 16-bit patterns are
    /// kept in an unsigned 16-bit storage buffer and it is the caller's job to
    /// interpret them.
    #[serde(default = "default_true")]
    pub expand_half: bool,

    /// Upper bound on the declared header length of a binary array payload.
    /// A header length above this limit is rejected before any allocation
    /// happens, so a corrupt length field cannot trigger an OOM.
    #[serde(default = "default_max_header_len")]
    pub max_header_len: usize,
}

// Default implementation to make constructing the options easier.
impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            expand_half: true,
            max_header_len: default_max_header_len(),
        }
    }
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}

/// Helper for `serde` to provide a default for `max_header_len`. (64KB)
fn default_max_header_len() -> usize {
    64 * 1024
}
