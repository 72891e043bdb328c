use std::{
    fs,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use tempfile::NamedTempFile;
use tracing::{debug, info, trace};

use crate::{
    error::Error,
    offset::{self, ByteOffset},
    span::LineSpan,
    utf8::Utf8CharReader,
    Result,
};

/// Result of a single indexing pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    /// Amount of lines found in the source
    pub line_count: usize,
    /// Size of the source in bytes. This is also the value of the last index record.
    pub total_bytes: ByteOffset,
    /// Span of the requested line, if the source has that line
    pub target: Option<LineSpan>,
}

/// Builds line indices.
///
/// An index consists of one 6 byte record per line holding the offset at which the line starts,
/// followed by a record holding the total length of the source. The span of line `n` is therefore
/// always `record[n]..record[n + 1]`, and an index for `n` lines is `6 * (n + 1)` bytes long.
///
/// Lines end at `\n`, `\r` or `\r\n`. A terminator at the very end of the source doesn't open
/// another (empty) line.
pub struct LineIndexBuilder;

impl LineIndexBuilder {
    /// Scans `source` once and writes the index into `index`. If `target` is set and the source
    /// contains that line, its span is returned within the summary so callers don't have to read
    /// the index again.
    pub fn build<R: Read, W: Write>(
        source: R,
        index: &mut W,
        target: Option<usize>,
    ) -> Result<BuildSummary> {
        let mut chars = Utf8CharReader::new(source);
        let mut scan = Scan::new(index, target);

        while let Some(c) = chars.read_char()? {
            scan.feed(c, chars.position())?;
        }

        scan.finish(chars.position())
    }

    /// Builds the index for the file at `source_path` and stores it at `index_path`.
    ///
    /// The index is written to a temporary file next to `index_path` and only moved into place
    /// once it is complete, so an interrupted build never leaves a truncated index behind. A
    /// failed build keeps an already existing index untouched.
    pub fn build_file<S, I>(source_path: S, index_path: I, target: Option<usize>) -> Result<BuildSummary>
    where
        S: AsRef<Path>,
        I: AsRef<Path>,
    {
        let source_path = source_path.as_ref();
        let index_path = index_path.as_ref();

        let source = fs::File::open(source_path).map_err(|e| Error::from_io_at(e, source_path))?;

        info!("writing index for {} to {}", source_path.display(), index_path.display());

        let dir = match index_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir).map_err(|e| Error::from_io_at(e, dir))?;
        let mut writer = BufWriter::new(tmp);

        // On error the temporary file gets dropped and deleted
        let summary = Self::build(BufReader::new(source), &mut writer, target)?;

        let tmp = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        tmp.persist(index_path)
            .map_err(|e| Error::from_io_at(e.error, index_path))?;

        debug!(
            lines = summary.line_count,
            bytes = summary.total_bytes,
            "index written"
        );
        Ok(summary)
    }
}

/// State of an indexing pass.
///
/// A line ended by `\r` might still grow by one byte if a `\n` follows, so the span of a
/// terminated line is only settled when the next character arrives. Until then its start is kept
/// in `previous_line_start`. The start of a line is written to the index once its first byte has
/// been consumed.
struct Scan<'a, W: Write> {
    index: &'a mut W,
    target: Option<usize>,

    /// Number of the line currently being scanned
    line_number: usize,
    current_line_start: ByteOffset,
    /// Start of line `line_number - 1` while its span is not settled yet
    previous_line_start: Option<ByteOffset>,
    /// Whether `current_line_start` was written to the index
    line_recorded: bool,
    after_cr: bool,

    target_span: Option<LineSpan>,
}

impl<'a, W: Write> Scan<'a, W> {
    fn new(index: &'a mut W, target: Option<usize>) -> Self {
        Self {
            index,
            target,
            line_number: 0,
            current_line_start: 0,
            previous_line_start: None,
            line_recorded: false,
            after_cr: false,
            target_span: None,
        }
    }

    /// Processes character `c`. `offset` is the position right after it.
    fn feed(&mut self, c: char, offset: ByteOffset) -> Result<()> {
        if self.after_cr && c == '\n' {
            // Second half of a \r\n. The line was already ended by the \r
            self.current_line_start = offset;
            self.after_cr = false;
            return Ok(());
        }

        self.after_cr = false;
        self.settle_previous()?;

        if !self.line_recorded {
            offset::write_offset(&mut *self.index, self.current_line_start)?;
            self.line_recorded = true;
        }

        if c == '\r' || c == '\n' {
            self.previous_line_start = Some(self.current_line_start);
            self.current_line_start = offset;
            self.line_number += 1;
            self.line_recorded = false;
            self.after_cr = c == '\r';
        }

        Ok(())
    }

    /// Fixes the span of the previously terminated line, which now ends at `current_line_start`.
    fn settle_previous(&mut self) -> Result<()> {
        let start = match self.previous_line_start.take() {
            Some(start) => start,
            None => return Ok(()),
        };

        let line = self.line_number - 1;
        if self.target == Some(line) {
            let span = LineSpan::between(line, start, self.current_line_start)?;
            trace!(line, ?span, "captured requested line");
            self.target_span = Some(span);
        }

        Ok(())
    }

    fn finish(mut self, total_bytes: ByteOffset) -> Result<BuildSummary> {
        self.settle_previous()?;

        let mut line_count = self.line_number;

        // Last line without terminator
        if self.line_recorded {
            if self.target == Some(self.line_number) {
                let span = LineSpan::between(self.line_number, self.current_line_start, total_bytes)?;
                trace!(line = self.line_number, ?span, "captured requested line");
                self.target_span = Some(span);
            }
            line_count += 1;
        }

        offset::write_offset(&mut *self.index, total_bytes)?;

        Ok(BuildSummary {
            line_count,
            total_bytes,
            target: self.target_span,
        })
    }
}
