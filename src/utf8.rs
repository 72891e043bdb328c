use std::io::{self, Read};

use crate::{error::Error, offset::ByteOffset, Result};

/// Reads single UTF-8 encoded characters from a byte stream while keeping track of the amount of
/// bytes consumed.
///
/// Text oriented readers hide the byte position of what they return, but the line index needs
/// exact byte offsets. The reader pulls one byte at a time from `R`, so wrap unbuffered sources
/// (like `std::fs::File`) into a `BufReader`.
#[derive(Debug)]
pub struct Utf8CharReader<R: Read> {
    inner: R,
    position: ByteOffset,
}

impl<R: Read> Utf8CharReader<R> {
    #[inline]
    pub fn new(inner: R) -> Utf8CharReader<R> {
        Self { inner, position: 0 }
    }

    /// Amount of bytes consumed so far.
    #[inline]
    pub fn position(&self) -> ByteOffset {
        self.position
    }

    /// Reads the next character. Returns `Ok(None)` if the stream ends before the first byte of a
    /// character.
    ///
    /// Invalid leading bytes, bad continuation bytes, sequences cut off by the end of the stream
    /// and non-shortest forms are returned as `Error::Decode` holding the offset at which the
    /// character started.
    pub fn read_char(&mut self) -> Result<Option<char>> {
        let start = self.position;

        let lead = match self.next_byte()? {
            Some(b) => b,
            None => return Ok(None),
        };

        let len = match sequence_len(lead) {
            Some(1) => return Ok(Some(lead as char)),
            Some(len) => len,
            None => return Err(Error::Decode { offset: start }),
        };

        let mut buf = [lead, 0, 0, 0];
        for slot in buf.iter_mut().take(len).skip(1) {
            match self.next_byte()? {
                Some(b) if b & 0xc0 == 0x80 => *slot = b,
                _ => return Err(Error::Decode { offset: start }),
            }
        }

        // Rejects overlong encodings, surrogates and values above U+10FFFF
        std::str::from_utf8(&buf[..len])
            .ok()
            .and_then(|s| s.chars().next())
            .map(Some)
            .ok_or(Error::Decode { offset: start })
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.position += 1;
                    return Ok(Some(byte[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Length of a UTF-8 sequence given its leading byte, or `None` if `lead` can't start one.
#[inline]
fn sequence_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7f => Some(1),
        _ if lead & 0xe0 == 0xc0 => Some(2),
        _ if lead & 0xf0 == 0xe0 => Some(3),
        _ if lead & 0xf8 == 0xf0 => Some(4),
        _ => None,
    }
}
