//! Variable-length integer readers for pack object headers: the type-and-size varint that opens
//! every object and the negative base offset that follows an offset-delta header.
//!
//! Both readers pull bytes through a `next_byte` closure so they work on top of the stream buffer
//! as well as on plain slices in tests.

use crate::errors::VerifyError;

const VAR_INT_ENCODING_BITS: u8 = 7;
const VAR_INT_CONTINUE_FLAG: u8 = 1 << VAR_INT_ENCODING_BITS;
const VAR_INT_VALUE_MASK: u8 = VAR_INT_CONTINUE_FLAG - 1;

/// Read the object header varint: returns the raw 3-bit type id and the decompressed size.
///
/// The first byte carries the type in bits 4-6 and the low 4 size bits; every following byte adds
/// 7 more bits while the msb is set. `offset` is only used to annotate errors.
pub fn read_type_and_size<F>(offset: u64, mut next_byte: F) -> Result<(u8, u64), VerifyError>
where
    F: FnMut() -> Result<u8, VerifyError>,
{
    let mut byte = next_byte()?;
    let type_id = (byte >> 4) & 0x07;
    let mut size = (byte & 0x0f) as u64;
    let mut shift = 4u32;

    while byte & VAR_INT_CONTINUE_FLAG != 0 {
        byte = next_byte()?;
        let bits = (byte & VAR_INT_VALUE_MASK) as u64;
        // bits shifted out of the top would be silently lost
        if shift >= u64::BITS || (bits << shift) >> shift != bits {
            return Err(VerifyError::SizeOverflow { offset });
        }
        size |= bits << shift;
        shift += VAR_INT_ENCODING_BITS as u32;
    }

    Ok((type_id, size))
}

/// Read the offset-delta base distance, a big-endian varint where every continuation adds one
/// before shifting, so `[0x80, 0x00]` means 128 rather than 0.
///
/// `offset` is the position of the delta object; a distance that does not fit in 64 bits can only
/// point before the start of the pack and is reported as out of bounds.
pub fn read_offset_encoding<F>(offset: u64, mut next_byte: F) -> Result<u64, VerifyError>
where
    F: FnMut() -> Result<u8, VerifyError>,
{
    let mut byte = next_byte()?;
    let mut distance = (byte & VAR_INT_VALUE_MASK) as u64;

    while byte & VAR_INT_CONTINUE_FLAG != 0 {
        distance = distance
            .checked_add(1)
            .filter(|d| d.leading_zeros() >= VAR_INT_ENCODING_BITS as u32)
            .ok_or(VerifyError::DeltaBaseOutOfBounds {
                offset,
                distance: u64::MAX,
            })?;
        byte = next_byte()?;
        distance = (distance << VAR_INT_ENCODING_BITS) | (byte & VAR_INT_VALUE_MASK) as u64;
    }

    Ok(distance)
}

/// Turn a base distance into the absolute offset of the base object.
///
/// The base must start strictly inside the pack and strictly before the delta, i.e.
/// `0 < distance < offset`; the check happens before subtracting.
pub fn resolve_base_offset(offset: u64, distance: u64) -> Result<u64, VerifyError> {
    if distance == 0 || distance >= offset {
        return Err(VerifyError::DeltaBaseOutOfBounds { offset, distance });
    }
    Ok(offset - distance)
}
