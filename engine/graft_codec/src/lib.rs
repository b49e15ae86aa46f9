//! Textual and binary codecs for the graft value graph.
//!
//! The textual codec produces the natural JSON rendering of a value:
//! structs become objects keyed by their exported field names, maps
//! and lists map onto objects and arrays. The binary codec serializes
//! a tagged wire form instead, since its format carries no structural
//! tags of its own.
//!
//! Decoding is loose in both directions: a decoded object is a map,
//! not a struct, unless it arrived through the binary wire form where
//! struct entries carry their field names.
//!
//! A value and its structural duplicate encode byte-identically under
//! both codecs; entry and field ordering is preserved end to end.

use std::io;

use graft_value::Value;
use thiserror::Error;

mod packed;

#[cfg(test)]
mod tests;

use packed::Packed;

/// Codec failure.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json codec: {0}")]
    Json(#[from] serde_json::Error),
    #[error("binary codec: {0}")]
    Binary(#[from] bincode::Error),
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

/// Encode `value` as a JSON byte buffer.
pub fn to_json_vec(value: &Value) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(value)?)
}

/// Encode `value` as a JSON string.
pub fn to_json_string(value: &Value) -> Result<String, CodecError> {
    Ok(serde_json::to_string(value)?)
}

/// Encode `value` as JSON into `writer`.
pub fn encode_json<W: io::Write>(writer: W, value: &Value) -> Result<(), CodecError> {
    Ok(serde_json::to_writer(writer, value)?)
}

/// Decode a value from a JSON byte slice.
pub fn from_json_slice(bytes: &[u8]) -> Result<Value, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decode a value from a JSON reader.
pub fn decode_json<R: io::Read>(reader: R) -> Result<Value, CodecError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Encode `value` as a binary byte buffer.
pub fn to_binary_vec(value: &Value) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serialize(&Packed::pack(value))?)
}

/// Encode `value` in binary form into `writer`.
pub fn encode_binary<W: io::Write>(writer: W, value: &Value) -> Result<(), CodecError> {
    Ok(bincode::serialize_into(writer, &Packed::pack(value))?)
}

/// Decode a value from a binary byte slice.
pub fn from_binary_slice(bytes: &[u8]) -> Result<Value, CodecError> {
    let packed: Packed = bincode::deserialize(bytes)?;
    Ok(packed.unpack())
}

/// Decode a value from a binary reader.
pub fn decode_binary<R: io::Read>(reader: R) -> Result<Value, CodecError> {
    let packed: Packed = bincode::deserialize_from(reader)?;
    Ok(packed.unpack())
}
