//! Vector codec
//!
//! Stored embeddings are plain little-endian IEEE-754 `f32` blobs, four bytes
//! per component, with no header. The encoding is bit-exact: NaN payloads and
//! signed zeros survive a round trip.

use crate::error::CodecError;
use crate::vector::Vector;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Width of one encoded component
pub const F32_WIDTH: usize = std::mem::size_of::<f32>();

/// Encode a vector into a byte blob
#[must_use]
pub fn encode(vector: &[f32]) -> Bytes {
    let mut buf = BytesMut::with_capacity(vector.len() * F32_WIDTH);
    for x in vector {
        buf.put_u32_le(x.to_bits());
    }
    buf.freeze()
}

/// Decode a byte blob back into a vector
pub fn decode(blob: &[u8]) -> Result<Vector, CodecError> {
    if blob.len() % F32_WIDTH != 0 {
        return Err(CodecError::Misaligned(blob.len()));
    }

    let mut buf = blob;
    let mut data = Vec::with_capacity(blob.len() / F32_WIDTH);
    while buf.has_remaining() {
        data.push(f32::from_bits(buf.get_u32_le()));
    }
    Ok(Vector::new(data))
}

/// Decode and check the component count against the store dimension
pub fn decode_with_dim(blob: &[u8], dim: usize) -> Result<Vector, CodecError> {
    let vector = decode(blob)?;
    if vector.dim() != dim {
        return Err(CodecError::WrongDimension {
            expected: dim,
            actual: vector.dim(),
        });
    }
    Ok(vector)
}
