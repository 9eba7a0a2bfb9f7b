//! Interchange codecs between `NdArray` and JSON-embeddable encodings.

pub mod json;
