use std::{
    fs,
    io::{BufReader, Read, Seek, SeekFrom},
    path::Path,
};

use itertools::Itertools;
use tracing::trace;

use crate::{
    error::Error,
    offset::{self, ByteOffset, OFFSET_SIZE},
    span::LineSpan,
    Result,
};

/// Looks up line spans in an index built by `LineIndexBuilder` without loading the index into
/// memory.
#[derive(Debug)]
pub struct LineIndexReader<R: Read + Seek> {
    reader: R,
    /// Amount of 6 byte records in the index
    records: u64,
}

impl LineIndexReader<fs::File> {
    /// Opens the index stored at `path`.
    ///
    /// Returns `Error::NotFound` if there is no index and `Error::MalformedIndex` if its length is
    /// not a multiple of the record size.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<LineIndexReader<fs::File>> {
        let path = path.as_ref();
        let file = fs::File::open(path).map_err(|e| Error::from_io_at(e, path))?;
        Self::new(file)
    }
}

impl<R: Read + Seek> LineIndexReader<R> {
    pub fn new(mut reader: R) -> Result<LineIndexReader<R>> {
        let len = reader.seek(SeekFrom::End(0))?;

        if len % OFFSET_SIZE as u64 != 0 {
            return Err(Error::malformed(format!(
                "length {} is not a multiple of {}",
                len, OFFSET_SIZE
            )));
        }

        Ok(Self {
            reader,
            records: len / OFFSET_SIZE as u64,
        })
    }

    /// Returns the amount of records stored in the index.
    #[inline]
    pub fn record_count(&self) -> u64 {
        self.records
    }

    /// Returns the amount of lines of the indexed file. The last record holds the file length, so
    /// this is one less than the record count.
    #[inline]
    pub fn total_lines(&self) -> u64 {
        self.records.saturating_sub(1)
    }

    /// Returns the span of `line` or `None` if the indexed file has no such line.
    ///
    /// Only the two records surrounding the line are read.
    pub fn lookup(&mut self, line: usize) -> Result<Option<LineSpan>> {
        if line as u64 >= self.total_lines() {
            return Ok(None);
        }

        self.reader
            .seek(SeekFrom::Start(line as u64 * OFFSET_SIZE as u64))?;

        let mut buf = [0; 2 * OFFSET_SIZE];
        self.reader.read_exact(&mut buf)?;

        let (start, end) = split_records(&buf);
        let span = LineSpan::between(line, start, end)?;
        trace!(line, ?span, "index lookup");
        Ok(Some(span))
    }

    /// Reads the whole index and returns the spans of all lines in order.
    pub fn spans(&mut self) -> Result<Vec<LineSpan>> {
        self.reader.seek(SeekFrom::Start(0))?;

        let mut reader = BufReader::new(&mut self.reader);
        let records = (0..self.records)
            .map(|_| offset::read_offset(&mut reader))
            .collect::<Result<Vec<_>>>()?;

        records
            .into_iter()
            .tuple_windows()
            .enumerate()
            .map(|(line, (start, end))| LineSpan::between(line, start, end))
            .collect()
    }
}

/// Decodes the two adjacent records read by `lookup`
#[inline]
fn split_records(buf: &[u8; 2 * OFFSET_SIZE]) -> (ByteOffset, ByteOffset) {
    let mut first = [0; OFFSET_SIZE];
    let mut second = [0; OFFSET_SIZE];
    first.copy_from_slice(&buf[..OFFSET_SIZE]);
    second.copy_from_slice(&buf[OFFSET_SIZE..]);
    (offset::decode(first), offset::decode(second))
}
