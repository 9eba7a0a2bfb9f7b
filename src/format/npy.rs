//! Parsing and serialization of a single self-describing binary array
//! payload: magic preamble, Python-dict-literal header, raw element bytes.
//!
//! The header text is normalized into valid JSON (quotes, booleans, tuple
//! parens, trailing commas) and then parsed with `serde_json`, so the header
//! grammar lives in one declarative struct instead of a hand-written lexer.
//! Parsing is synchronous and pure given an in-memory byte buffer.

use serde::Deserialize;

use crate::array::NdArray;
use crate::config::LoadOptions;
use crate::error::NdPackError;
use crate::format::{
    ArrayRecord, NPY_HEADER_ALIGN, NPY_HEADER_LEN_OFFSET, NPY_MAGIC, NPY_VERSION_OFFSET,
    NPY_WRITE_VERSION,
};
use crate::kernels::cast;
use crate::types::DType;

//==================================================================================
// 1. Header Dict
//==================================================================================

/// The normalized header dictionary: `{'descr': '<f8', 'fortran_order':
/// False, 'shape': (2, 3), }` after JSON normalization.
#[derive(Debug, Deserialize)]
struct HeaderDict {
    descr: String,
    fortran_order: bool,
    shape: Vec<usize>,
}

/// Rewrites a Python dict literal into JSON: single quotes become double
/// quotes, tuple parens become brackets, everything is lower-cased (fixing
/// `True`/`False`), and trailing commas before a closing bracket are
/// stripped.
fn normalize_header(text: &str) -> String {
    let mut converted = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\'' => converted.push('"'),
            '(' => converted.push('['),
            ')' => converted.push(']'),
            c => converted.extend(c.to_lowercase()),
        }
    }

    let mut out = String::with_capacity(converted.len());
    for ch in converted.chars() {
        if ch == ']' || ch == '}' {
            while matches!(out.chars().last(), Some(c) if c == ',' || c.is_whitespace()) {
                out.pop();
            }
        }
        out.push(ch);
    }
    out
}

//==================================================================================
// 2. Parser
//==================================================================================

/// Decodes one binary array payload into its raw record.
pub fn parse(bytes: &[u8], options: &LoadOptions) -> Result<ArrayRecord, NdPackError> {
    if bytes.len() < NPY_HEADER_LEN_OFFSET + 2 {
        return Err(NdPackError::MalformedHeader(
            "payload too short for the fixed preamble".to_string(),
        ));
    }
    if &bytes[..NPY_MAGIC.len()] != NPY_MAGIC {
        return Err(NdPackError::MalformedHeader(
            "bad magic number".to_string(),
        ));
    }

    let major = bytes[NPY_VERSION_OFFSET];
    let minor = bytes[NPY_VERSION_OFFSET + 1];
    let (header_len, header_start) = match major {
        1 => {
            let len = u16::from_le_bytes([
                bytes[NPY_HEADER_LEN_OFFSET],
                bytes[NPY_HEADER_LEN_OFFSET + 1],
            ]) as usize;
            (len, NPY_HEADER_LEN_OFFSET + 2)
        }
        2 | 3 => {
            if bytes.len() < NPY_HEADER_LEN_OFFSET + 4 {
                return Err(NdPackError::MalformedHeader(
                    "payload too short for a version 2 length field".to_string(),
                ));
            }
            let len = u32::from_le_bytes([
                bytes[NPY_HEADER_LEN_OFFSET],
                bytes[NPY_HEADER_LEN_OFFSET + 1],
                bytes[NPY_HEADER_LEN_OFFSET + 2],
                bytes[NPY_HEADER_LEN_OFFSET + 3],
            ]) as usize;
            (len, NPY_HEADER_LEN_OFFSET + 4)
        }
        _ => {
            return Err(NdPackError::MalformedHeader(format!(
                "unsupported format version {}.{}",
                major, minor
            )))
        }
    };

    // SECURITY: Validate the declared length against the cap and the buffer
    // before allocating or slicing anything.
    if header_len > options.max_header_len {
        return Err(NdPackError::MalformedHeader(format!(
            "declared header length {} exceeds the configured cap {}",
            header_len, options.max_header_len
        )));
    }
    let data_offset = header_start + header_len;
    if bytes.len() < data_offset {
        return Err(NdPackError::MalformedHeader(
            "declared header length exceeds the buffer".to_string(),
        ));
    }

    let header_text = std::str::from_utf8(&bytes[header_start..data_offset])
        .map_err(|e| NdPackError::MalformedHeader(format!("header is not UTF-8: {}", e)))?;
    let normalized = normalize_header(header_text);
    let dict: HeaderDict = serde_json::from_str(&normalized).map_err(|e| {
        NdPackError::MalformedHeader(format!("header dict did not parse: {}", e))
    })?;

    let dtype = DType::from_descr(&dict.descr)?;
    let expected_bytes = dtype.size_of() * dict.shape.iter().product::<usize>();
    let payload = &bytes[data_offset..];
    if payload.len() < expected_bytes {
        return Err(NdPackError::MalformedHeader(format!(
            "payload holds {} data bytes, header implies {}",
            payload.len(),
            expected_bytes
        )));
    }

    let data = cast::buffer_from_le_bytes(dtype, &payload[..expected_bytes], options.expand_half)?;
    log::debug!(
        "parsed array payload: dtype={}, shape={:?}, fortran_order={}",
        dtype,
        dict.shape,
        dict.fortran_order
    );

    Ok(ArrayRecord {
        dtype,
        data,
        shape: dict.shape,
        fortran_order: dict.fortran_order,
    })
}

//==================================================================================
// 3. Encoder
//==================================================================================

/// Serializes an array into a version 1.0 binary payload: C-order,
/// little-endian, header padded to a 64-byte-aligned data offset.
///
/// Half-precision arrays are refused: their storage has already been expanded
/// and would have to be re-packed lossily. Callers should write them as
/// `float32`.
pub fn encode(array: &NdArray) -> Result<Vec<u8>, NdPackError> {
    if array.dtype() == DType::Float16 {
        return Err(NdPackError::UnsupportedDtype(
            "float16 (write the expanded float32 array instead)".to_string(),
        ));
    }

    let shape_tuple = match array.shape() {
        [] => "()".to_string(),
        [extent] => format!("({},)", extent),
        dims => {
            let joined = dims
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("({})", joined)
        }
    };
    let mut dict = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
        array.dtype().descr(),
        shape_tuple
    );

    // Pad with spaces so the data section starts on the alignment boundary,
    // with a closing newline as the last header byte.
    let preamble = NPY_HEADER_LEN_OFFSET + 2;
    let unpadded = preamble + dict.len() + 1;
    let padding = (NPY_HEADER_ALIGN - unpadded % NPY_HEADER_ALIGN) % NPY_HEADER_ALIGN;
    dict.extend(std::iter::repeat(' ').take(padding));
    dict.push('\n');

    let data = array.buffer().to_le_bytes();
    let mut out = Vec::with_capacity(preamble + dict.len() + data.len());
    out.extend_from_slice(NPY_MAGIC);
    out.push(NPY_WRITE_VERSION.0);
    out.push(NPY_WRITE_VERSION.1);
    out.extend_from_slice(&(dict.len() as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.extend_from_slice(&data);
    Ok(out)
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
