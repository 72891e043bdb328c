use crate::{error::Error, offset::ByteOffset, Result};

/// The byte range of a single line within the source file, terminator included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineSpan {
    pub start: ByteOffset,
    /// Length in bytes, not characters
    pub length: u32,
}

impl LineSpan {
    #[inline]
    pub fn new(start: ByteOffset, length: u32) -> LineSpan {
        Self { start, length }
    }

    /// Creates the span of line `line` covering `start..end`.
    pub(crate) fn between(line: usize, start: ByteOffset, end: ByteOffset) -> Result<LineSpan> {
        let length = end
            .checked_sub(start)
            .ok_or_else(|| Error::malformed(format!("line {} ends before it starts", line)))?;
        let length = u32::try_from(length).map_err(|_| Error::LineTooLong { line, length })?;
        Ok(Self::new(start, length))
    }

    /// Offset of the first byte after the span
    #[inline]
    pub fn end(&self) -> ByteOffset {
        self.start + self.length as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between() {
        let span = LineSpan::between(3, 10, 14).unwrap();
        assert_eq!(span, LineSpan::new(10, 4));
        assert_eq!(span.end(), 14);
        assert_eq!(LineSpan::between(0, 5, 5).unwrap().length, 0);
    }

    #[test]
    fn test_between_invalid() {
        assert!(matches!(
            LineSpan::between(1, 9, 4),
            Err(Error::MalformedIndex { .. })
        ));

        let too_long = u32::MAX as u64 + 1;
        assert!(matches!(
            LineSpan::between(7, 0, too_long),
            Err(Error::LineTooLong { line: 7, length }) if length == too_long
        ));
    }
}
