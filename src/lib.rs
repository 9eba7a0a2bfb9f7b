//! This file is the root of the `ndpack` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of the library (`array`, `format`,
//!     `codec`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the public surface: the array value type, the loaders,
//!     and the interchange codec entry points.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================

pub mod array;
pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod kernels;
pub mod types;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================

pub use array::{DataBuffer, Fill, Idx, Item, NdArray, Scalar};
pub use codec::json::{decode as decode_json, encode as encode_json, infer_format, Format};
pub use config::LoadOptions;
pub use error::NdPackError;
pub use format::npy::{encode as encode_npy, parse as parse_npy};
pub use format::npz::{load_npy_file, load_npz_bytes, load_npz_file};
pub use format::ArrayRecord;
pub use types::{DType, StorageKind};

//==================================================================================
// 3. Logging Bootstrap
//==================================================================================

/// Turns on env-filtered logging for ad-hoc diagnostics (tests, benches,
/// small binaries). Safe to call more than once.
pub fn enable_verbose_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
