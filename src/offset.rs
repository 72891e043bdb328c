use std::io::{Read, Write};

use crate::{error::Error, Result};

/// A byte position within a source file.
pub type ByteOffset = u64;

/// Size of one encoded offset record in bytes
pub const OFFSET_SIZE: usize = 6;

/// Largest offset an index record can hold (2^48 - 1)
pub const MAX_OFFSET: ByteOffset = (1 << (OFFSET_SIZE * 8)) - 1;

/// Bytes of a `u64` dropped by the encoding
const SKIPPED: usize = 8 - OFFSET_SIZE;

/// Encodes `offset` as a 6 byte big-endian record.
#[inline]
pub fn encode(offset: ByteOffset) -> Result<[u8; OFFSET_SIZE]> {
    if offset > MAX_OFFSET {
        return Err(Error::OffsetOutOfRange(offset));
    }

    let mut out = [0; OFFSET_SIZE];
    out.copy_from_slice(&offset.to_be_bytes()[SKIPPED..]);
    Ok(out)
}

/// Decodes a 6 byte big-endian record.
#[inline]
pub fn decode(record: [u8; OFFSET_SIZE]) -> ByteOffset {
    let mut full = [0; 8];
    full[SKIPPED..].copy_from_slice(&record);
    u64::from_be_bytes(full)
}

/// Encodes `offset` and writes the record into `writer`
#[inline]
pub fn write_offset<W: Write>(writer: &mut W, offset: ByteOffset) -> Result<()> {
    writer.write_all(&encode(offset)?)?;
    Ok(())
}

/// Reads a single record from `reader`
#[inline]
pub fn read_offset<R: Read>(reader: &mut R) -> Result<ByteOffset> {
    let mut record = [0; OFFSET_SIZE];
    reader.read_exact(&mut record)?;
    Ok(decode(record))
}
