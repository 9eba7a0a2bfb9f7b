//! Format-sniffing encode/decode between `NdArray` and the four
//! JSON-embeddable encodings: plain nested list, zero-dimensional scalar,
//! nested list with metadata, hex string, and base64 string.
//!
//! A plain JSON array is recognized structurally; every other encoding is an
//! object carrying a namespace-qualified format marker plus `shape`, `dtype`
//! and `data` fields. The closed `Format` enum drives dispatch, so an
//! unrecognized marker is an explicit error, never a silent fallthrough.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};

use crate::array::{DataBuffer, NdArray, Scalar};
use crate::error::NdPackError;
use crate::kernels::{cast, float16};
use crate::types::DType;

//==================================================================================
// 1. Format Tags
//==================================================================================

/// The field holding the format marker on metadata-bearing objects.
pub const FORMAT_KEY: &str = "format";
/// Namespace prefix written by the encoder. Decoding matches marker suffixes
/// only, so foreign namespaces interoperate.
const TAG_NAMESPACE: &str = "ndpack";

const TAG_ZERO_DIM: &str = "zero_dim";
const TAG_LIST_META: &str = "array_list_meta";
const TAG_HEX_META: &str = "array_hex_meta";
const TAG_B64_META: &str = "array_b64_meta";

/// The recognized interchange encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// A bare JSON array of numbers. Carries no metadata; decodes as 1-D
    /// `float64` with shape `[outer length]`.
    List,
    /// A single scalar with metadata.
    ZeroDim,
    /// A nested number list with metadata.
    ListMeta,
    /// Little-endian element bytes as a hex string, with metadata.
    HexMeta,
    /// Little-endian element bytes as a standard-alphabet base64 string,
    /// with metadata.
    B64Meta,
}

/// Inspects a JSON value for a known format. A bare array is the list
/// format; an object is classified by its marker suffix. Returns `None` when
/// nothing matches.
pub fn infer_format(value: &Value) -> Option<Format> {
    match value {
        Value::Array(_) => Some(Format::List),
        Value::Object(map) => {
            let tag = map.get(FORMAT_KEY)?.as_str()?;
            if tag.ends_with(TAG_ZERO_DIM) {
                Some(Format::ZeroDim)
            } else if tag.ends_with(TAG_LIST_META) {
                Some(Format::ListMeta)
            } else if tag.ends_with(TAG_HEX_META) {
                Some(Format::HexMeta)
            } else if tag.ends_with(TAG_B64_META) {
                Some(Format::B64Meta)
            } else {
                None
            }
        }
        _ => None,
    }
}

//==================================================================================
// 2. Metadata Extraction
//==================================================================================

struct Meta {
    dtype: DType,
    shape: Vec<usize>,
}

fn require_meta(value: &Value) -> Result<Meta, NdPackError> {
    let map = value
        .as_object()
        .ok_or_else(|| NdPackError::MissingMetadata("expected a JSON object".to_string()))?;

    let shape = map
        .get("shape")
        .and_then(Value::as_array)
        .ok_or_else(|| NdPackError::MissingMetadata("shape".to_string()))?
        .iter()
        .map(|v| {
            v.as_u64()
                .map(|e| e as usize)
                .ok_or_else(|| NdPackError::MissingMetadata("shape".to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let dtype_name = map
        .get("dtype")
        .and_then(Value::as_str)
        .ok_or_else(|| NdPackError::MissingMetadata("dtype".to_string()))?;
    let dtype = DType::from_name(dtype_name)?;

    Ok(Meta { dtype, shape })
}

fn require_data(value: &Value) -> Result<&Value, NdPackError> {
    value
        .as_object()
        .and_then(|map| map.get("data"))
        .ok_or_else(|| NdPackError::MissingMetadata("data".to_string()))
}

/// Reads one JSON number in the lane matching `dtype`: unsigned and signed
/// 64-bit integers stay in their native representation, floats go through
/// f64.
fn scalar_from_value(value: &Value, dtype: DType) -> Result<Scalar, NdPackError> {
    let scalar = if dtype.is_unsigned_int() {
        value.as_u64().map(Scalar::UInt)
    } else if dtype.is_signed_int() {
        value.as_i64().map(Scalar::Int)
    } else {
        value.as_f64().map(Scalar::Float)
    };
    scalar.ok_or_else(|| {
        NdPackError::MissingMetadata(format!("data: expected a number compatible with {}", dtype))
    })
}

/// Depth-first flatten of arbitrarily nested arrays into scalars.
fn flatten_values(
    value: &Value,
    dtype: DType,
    out: &mut Vec<Scalar>,
) -> Result<(), NdPackError> {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_values(item, dtype, out)?;
            }
            Ok(())
        }
        _ => {
            out.push(scalar_from_value(value, dtype)?);
            Ok(())
        }
    }
}

//==================================================================================
// 3. Decoding
//==================================================================================

/// Decodes a JSON value into an `NdArray`, auto-detecting the format when
/// one is not supplied.
pub fn decode(value: &Value, format: Option<Format>) -> Result<NdArray, NdPackError> {
    let format = match format {
        Some(f) => f,
        None => infer_format(value).ok_or(NdPackError::FormatUnknown)?,
    };
    match format {
        Format::List => decode_list(value),
        Format::ZeroDim => decode_zero_dim(value),
        Format::ListMeta => decode_list_meta(value),
        Format::HexMeta | Format::B64Meta => decode_bytes_meta(value, format),
    }
}

/// Bare list: flattened into `float64`, shape taken from the OUTER length
/// only. Nested input therefore fails the shape/length invariant rather than
/// inferring a deeper shape; producers with multi-dimensional data use the
/// metadata-bearing list format instead.
fn decode_list(value: &Value) -> Result<NdArray, NdPackError> {
    let outer = value.as_array().ok_or(NdPackError::FormatUnknown)?;
    let shape = vec![outer.len()];
    let mut values = Vec::with_capacity(outer.len());
    flatten_values(value, DType::Float64, &mut values)?;
    NdArray::new(DataBuffer::from_scalars(DType::Float64, &values), shape, DType::Float64)
}

fn decode_zero_dim(value: &Value) -> Result<NdArray, NdPackError> {
    let meta = require_meta(value)?;
    let scalar = scalar_from_value(require_data(value)?, meta.dtype)?;
    NdArray::new(
        DataBuffer::from_scalars(meta.dtype, &[scalar]),
        meta.shape,
        meta.dtype,
    )
}

fn decode_list_meta(value: &Value) -> Result<NdArray, NdPackError> {
    let meta = require_meta(value)?;
    let data = require_data(value)?;

    let buffer = if meta.dtype == DType::Float16 {
        // Half-precision list data carries the packed 16-bit patterns; the
        // post-load conversion expands them after the buffer is built.
        let mut packed = Vec::new();
        flatten_values(data, DType::UInt16, &mut packed)?;
        let bits: Vec<u16> = packed.iter().map(|s| s.as_u64() as u16).collect();
        DataBuffer::F32(float16::decode_slice(&bits))
    } else {
        let mut values = Vec::new();
        flatten_values(data, meta.dtype, &mut values)?;
        DataBuffer::from_scalars(meta.dtype, &values)
    };

    NdArray::new(buffer, meta.shape, meta.dtype)
}

fn decode_bytes_meta(value: &Value, format: Format) -> Result<NdArray, NdPackError> {
    let meta = require_meta(value)?;
    let text = require_data(value)?
        .as_str()
        .ok_or_else(|| NdPackError::MissingMetadata("data".to_string()))?;

    let raw = match format {
        Format::HexMeta => hex::decode(text)
            .map_err(|e| NdPackError::InvalidEncoding(format!("hex: {}", e)))?,
        Format::B64Meta => BASE64_STANDARD
            .decode(text)
            .map_err(|e| NdPackError::InvalidEncoding(format!("base64: {}", e)))?,
        _ => {
            return Err(NdPackError::InternalError(
                "decode_bytes_meta called with a non-byte format".to_string(),
            ))
        }
    };

    let buffer = cast::buffer_from_le_bytes(meta.dtype, &raw, true)?;
    NdArray::new(buffer, meta.shape, meta.dtype)
}

//==================================================================================
// 4. Encoding
//==================================================================================

fn scalar_to_value(scalar: &Scalar) -> Result<Value, NdPackError> {
    Ok(match *scalar {
        Scalar::UInt(v) => Value::from(v),
        Scalar::Int(v) => Value::from(v),
        Scalar::Float(v) => serde_json::Number::from_f64(v).map(Value::Number).ok_or_else(
            || NdPackError::InvalidEncoding("non-finite float is not a JSON number".to_string()),
        )?,
    })
}

/// Rebuilds the nested list structure implied by `shape` from a flat,
/// row-major scalar sequence.
fn nested_from_scalars(scalars: &[Scalar], shape: &[usize]) -> Result<Value, NdPackError> {
    match shape {
        [] => scalar_to_value(&scalars[0]),
        [_] => Ok(Value::Array(
            scalars
                .iter()
                .map(scalar_to_value)
                .collect::<Result<Vec<_>, _>>()?,
        )),
        [outer, rest @ ..] => {
            if *outer == 0 {
                return Ok(Value::Array(Vec::new()));
            }
            let chunk = scalars.len() / outer;
            let mut groups = Vec::with_capacity(*outer);
            if chunk == 0 {
                for _ in 0..*outer {
                    groups.push(nested_from_scalars(&[], rest)?);
                }
            } else {
                for part in scalars.chunks(chunk) {
                    groups.push(nested_from_scalars(part, rest)?);
                }
            }
            Ok(Value::Array(groups))
        }
    }
}

fn marker(tag: &str) -> String {
    format!("{}.{}", TAG_NAMESPACE, tag)
}

/// Encodes an array into the requested interchange format.
///
/// Half-precision arrays are refused (their storage is already expanded);
/// encode the equivalent `float32` array instead.
pub fn encode(array: &NdArray, format: Format) -> Result<Value, NdPackError> {
    if array.dtype() == DType::Float16 {
        return Err(NdPackError::UnsupportedDtype(
            "float16 (encode the expanded float32 array instead)".to_string(),
        ));
    }

    match format {
        Format::List => {
            let values = array
                .to_scalars()
                .iter()
                .map(scalar_to_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(values))
        }
        Format::ZeroDim => {
            if array.size() != 1 {
                return Err(NdPackError::SizeMismatch {
                    expected: 1,
                    actual: array.size(),
                });
            }
            Ok(json!({
                (FORMAT_KEY): marker(TAG_ZERO_DIM),
                "dtype": array.dtype().name(),
                "shape": [],
                "data": scalar_to_value(&array.to_scalars()[0])?,
            }))
        }
        Format::ListMeta => Ok(json!({
            (FORMAT_KEY): marker(TAG_LIST_META),
            "dtype": array.dtype().name(),
            "shape": array.shape(),
            "data": nested_from_scalars(&array.to_scalars(), array.shape())?,
        })),
        Format::HexMeta => Ok(json!({
            (FORMAT_KEY): marker(TAG_HEX_META),
            "dtype": array.dtype().name(),
            "shape": array.shape(),
            "data": hex::encode(array.buffer().to_le_bytes()),
        })),
        Format::B64Meta => Ok(json!({
            (FORMAT_KEY): marker(TAG_B64_META),
            "dtype": array.dtype().name(),
            "shape": array.shape(),
            "data": BASE64_STANDARD.encode(array.buffer().to_le_bytes()),
        })),
    }
}

//==================================================================================
// 5. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_2x3() -> NdArray {
        NdArray::new(
            DataBuffer::I64(vec![1, 2, 3, 4, 5, 6]),
            vec![2, 3],
            DType::Int64,
        )
        .unwrap()
    }

    #[test]
    fn test_infer_format_recognizes_every_marker() {
        assert_eq!(infer_format(&json!([1, 2, 3])), Some(Format::List));
        assert_eq!(
            infer_format(&json!({"format": "ndpack.zero_dim"})),
            Some(Format::ZeroDim)
        );
        assert_eq!(
            infer_format(&json!({"format": "other_ns.array_list_meta"})),
            Some(Format::ListMeta)
        );
        assert_eq!(
            infer_format(&json!({"format": "ndpack.array_hex_meta"})),
            Some(Format::HexMeta)
        );
        assert_eq!(
            infer_format(&json!({"format": "ndpack.array_b64_meta"})),
            Some(Format::B64Meta)
        );
        assert_eq!(infer_format(&json!({"format": "ndpack.mystery"})), None);
        assert_eq!(infer_format(&json!({"other": 1})), None);
        assert_eq!(infer_format(&json!(42)), None);
    }

    #[test]
    fn test_decode_unknown_format_is_rejected() {
        assert!(matches!(
            decode(&json!({"no": "marker"}), None),
            Err(NdPackError::FormatUnknown)
        ));
    }

    #[test]
    fn test_plain_list_decodes_as_one_dimensional_float64() {
        let arr = decode(&json!([1.5, 2.5, 3.0]), None).unwrap();
        assert_eq!(arr.dtype(), DType::Float64);
        assert_eq!(arr.shape(), &[3]);
        assert_eq!(
            arr.to_scalars(),
            vec![
                Scalar::Float(1.5),
                Scalar::Float(2.5),
                Scalar::Float(3.0)
            ]
        );
    }

    #[test]
    fn test_nested_plain_list_fails_the_shape_invariant() {
        // The bare list format only looks at the outer length, so nested
        // input flattens to more elements than the shape holds.
        let result = decode(&json!([[1, 2], [3, 4]]), None);
        assert!(matches!(result, Err(NdPackError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_zero_dim_roundtrip_preserves_u64_precision() {
        let original = NdArray::new(
            DataBuffer::U64(vec![18446744073709551615]),
            vec![],
            DType::UInt64,
        )
        .unwrap();
        let value = encode(&original, Format::ZeroDim).unwrap();
        let decoded = decode(&value, None).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(
            decoded.to_scalars(),
            vec![Scalar::UInt(18446744073709551615)]
        );
    }

    #[test]
    fn test_list_meta_roundtrip_keeps_shape_and_dtype() {
        let original = fixture_2x3();
        let value = encode(&original, Format::ListMeta).unwrap();
        // The nested data mirrors the shape.
        assert_eq!(value["data"], json!([[1, 2, 3], [4, 5, 6]]));
        let decoded = decode(&value, None).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_hex_meta_roundtrip() {
        let original = NdArray::new(
            DataBuffer::F32(vec![0.5, -1.25, 3.0]),
            vec![3],
            DType::Float32,
        )
        .unwrap();
        let value = encode(&original, Format::HexMeta).unwrap();
        let decoded = decode(&value, None).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_b64_meta_roundtrip_preserves_u64_precision() {
        let original = NdArray::new(
            DataBuffer::U64(vec![u64::MAX, 0, 12345678901234567890]),
            vec![3],
            DType::UInt64,
        )
        .unwrap();
        let value = encode(&original, Format::B64Meta).unwrap();
        let decoded = decode(&value, None).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_b64_meta_decodes_half_precision_with_expansion() {
        // [1.0, -2.0] as packed binary16 bytes.
        let bytes: Vec<u8> = [0x3C00u16, 0xC000]
            .iter()
            .flat_map(|b| b.to_le_bytes())
            .collect();
        let value = json!({
            "format": "ndpack.array_b64_meta",
            "dtype": "float16",
            "shape": [2],
            "data": BASE64_STANDARD.encode(&bytes),
        });
        let decoded = decode(&value, None).unwrap();
        assert_eq!(decoded.dtype(), DType::Float16);
        assert_eq!(
            decoded.to_scalars(),
            vec![Scalar::Float(1.0), Scalar::Float(-2.0)]
        );
    }

    #[test]
    fn test_list_meta_decodes_half_precision_bit_patterns() {
        let value = json!({
            "format": "ndpack.array_list_meta",
            "dtype": "float16",
            "shape": [2],
            "data": [0x3C00, 0xC000],
        });
        let decoded = decode(&value, None).unwrap();
        assert_eq!(
            decoded.to_scalars(),
            vec![Scalar::Float(1.0), Scalar::Float(-2.0)]
        );
    }

    #[test]
    fn test_missing_metadata_fields_are_rejected() {
        let no_shape = json!({
            "format": "ndpack.array_hex_meta",
            "dtype": "uint8",
            "data": "01",
        });
        assert!(matches!(
            decode(&no_shape, None),
            Err(NdPackError::MissingMetadata(_))
        ));

        let no_dtype = json!({
            "format": "ndpack.array_hex_meta",
            "shape": [1],
            "data": "01",
        });
        assert!(matches!(
            decode(&no_dtype, None),
            Err(NdPackError::MissingMetadata(_))
        ));

        let no_data = json!({
            "format": "ndpack.array_hex_meta",
            "dtype": "uint8",
            "shape": [1],
        });
        assert!(matches!(
            decode(&no_data, None),
            Err(NdPackError::MissingMetadata(_))
        ));
    }

    #[test]
    fn test_unknown_dtype_name_is_rejected() {
        let value = json!({
            "format": "ndpack.array_hex_meta",
            "dtype": "float128",
            "shape": [1],
            "data": "00",
        });
        assert!(matches!(
            decode(&value, None),
            Err(NdPackError::UnsupportedDtype(_))
        ));
    }

    #[test]
    fn test_corrupt_string_payloads_are_rejected() {
        let bad_hex = json!({
            "format": "ndpack.array_hex_meta",
            "dtype": "uint8",
            "shape": [1],
            "data": "zz",
        });
        assert!(matches!(
            decode(&bad_hex, None),
            Err(NdPackError::InvalidEncoding(_))
        ));

        let bad_b64 = json!({
            "format": "ndpack.array_b64_meta",
            "dtype": "uint8",
            "shape": [1],
            "data": "!!!",
        });
        assert!(matches!(
            decode(&bad_b64, None),
            Err(NdPackError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_byte_length_must_match_the_declared_shape() {
        let value = json!({
            "format": "ndpack.array_hex_meta",
            "dtype": "uint16",
            "shape": [3],
            "data": "0100", // one u16, shape says three
        });
        assert!(matches!(
            decode(&value, None),
            Err(NdPackError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_explicit_format_overrides_detection() {
        // A bare array forced through the list decoder explicitly.
        let arr = decode(&json!([1, 2]), Some(Format::List)).unwrap();
        assert_eq!(arr.shape(), &[2]);

        // Forcing a metadata format onto a bare array fails on metadata.
        assert!(matches!(
            decode(&json!([1, 2]), Some(Format::HexMeta)),
            Err(NdPackError::MissingMetadata(_))
        ));
    }

    #[test]
    fn test_encode_zero_dim_requires_a_single_element() {
        let arr = fixture_2x3();
        assert!(matches!(
            encode(&arr, Format::ZeroDim),
            Err(NdPackError::SizeMismatch {
                expected: 1,
                actual: 6
            })
        ));
    }

    #[test]
    fn test_encode_refuses_expanded_half_precision() {
        let arr = NdArray::new(DataBuffer::F32(vec![1.0]), vec![1], DType::Float16).unwrap();
        assert!(matches!(
            encode(&arr, Format::B64Meta),
            Err(NdPackError::UnsupportedDtype(_))
        ));
    }

    #[test]
    fn test_int64_list_meta_preserves_extremes() {
        let original = NdArray::new(
            DataBuffer::I64(vec![i64::MIN, -1, i64::MAX]),
            vec![3],
            DType::Int64,
        )
        .unwrap();
        let value = encode(&original, Format::ListMeta).unwrap();
        let decoded = decode(&value, None).unwrap();
        assert_eq!(decoded, original);
    }
}
