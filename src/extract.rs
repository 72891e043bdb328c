use std::{
    ffi::OsString,
    fs,
    io::{Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    builder::LineIndexBuilder, error::Error, index::LineIndexReader, span::LineSpan, Result,
};

/// Extension appended to the source path to get the path of its index
pub const INDEX_EXTENSION: &str = ".idx";

const BOM: char = '\u{feff}';

/// Reads single lines of a text file using a line index stored next to it.
///
/// The index gets built on the first access and reused afterwards. It is never checked against
/// the source again, so after the source file changed, call `rebuild_index`.
#[derive(Debug, Clone)]
pub struct LineExtractor {
    source: PathBuf,
    index: PathBuf,
}

impl LineExtractor {
    /// Creates a new `LineExtractor` for the file at `source`, using `<source>.idx` as index.
    pub fn new<P: AsRef<Path>>(source: P) -> LineExtractor {
        let source = source.as_ref().to_path_buf();
        let index = index_path_for(&source);
        Self { source, index }
    }

    /// Use `index` as location of the index instead of `<source>.idx`.
    pub fn with_index_path<P: AsRef<Path>>(mut self, index: P) -> LineExtractor {
        self.index = index.as_ref().to_path_buf();
        self
    }

    #[inline]
    pub fn source_path(&self) -> &Path {
        &self.source
    }

    #[inline]
    pub fn index_path(&self) -> &Path {
        &self.index
    }

    /// Returns `true` if an index exists for the source file. Fails if that can't be determined,
    /// for example due to missing permissions.
    #[inline]
    pub fn has_index(&self) -> Result<bool> {
        Ok(self.index.try_exists()?)
    }

    /// Reads the given line. Trailing `\r` and `\n` get removed and so does a byte order mark at
    /// the beginning of the file.
    ///
    /// Returns `Ok(None)` if the file has no such line.
    pub fn read_line(&self, line: usize) -> Result<Option<String>> {
        let span = match self.span(line)? {
            Some(span) => span,
            None => return Ok(None),
        };

        let mut buf = Vec::with_capacity(span.length as usize);
        self.read_span(span, &mut buf)?;

        let text = String::from_utf8(buf)?;
        Ok(Some(clean_line(text, span.start)))
    }

    /// Reads the bytes of the given line, including its terminator, and appends them to `buf`.
    /// Returns the amount of bytes read or `None` if the file has no such line.
    pub fn read_line_raw(&self, line: usize, buf: &mut Vec<u8>) -> Result<Option<usize>> {
        match self.span(line)? {
            Some(span) => self.read_span(span, buf).map(Some),
            None => Ok(None),
        }
    }

    /// Returns the span of `line`, building the index first if there is none yet.
    pub fn span(&self, line: usize) -> Result<Option<LineSpan>> {
        if self.has_index()? {
            return LineIndexReader::open(&self.index)?.lookup(line);
        }

        // The scan finds the requested line on its way, so there is no need to open the fresh
        // index again.
        let summary = LineIndexBuilder::build_file(&self.source, &self.index, Some(line))?;
        Ok(summary.target)
    }

    /// Returns the amount of lines in the source file, building the index if necessary.
    pub fn total_lines(&self) -> Result<u64> {
        if !self.has_index()? {
            let summary = LineIndexBuilder::build_file(&self.source, &self.index, None)?;
            return Ok(summary.line_count as u64);
        }

        Ok(LineIndexReader::open(&self.index)?.total_lines())
    }

    /// Throws away an existing index and builds a new one.
    pub fn rebuild_index(&self) -> Result<u64> {
        match fs::remove_file(&self.index) {
            Ok(()) => debug!("removed index {}", self.index.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let summary = LineIndexBuilder::build_file(&self.source, &self.index, None)?;
        Ok(summary.line_count as u64)
    }

    /// Reads exactly the bytes of `span` from the source into `buf`.
    fn read_span(&self, span: LineSpan, buf: &mut Vec<u8>) -> Result<usize> {
        let mut file = fs::File::open(&self.source).map_err(|e| Error::from_io_at(e, &self.source))?;
        file.seek(SeekFrom::Start(span.start))?;

        let len = span.length as usize;
        let old_len = buf.len();
        buf.resize(old_len + len, 0);
        file.read_exact(&mut buf[old_len..])?;

        Ok(len)
    }
}

/// Reads line `line` of the file at `path`. See `LineExtractor::read_line`.
pub fn extract_line<P: AsRef<Path>>(path: P, line: usize) -> Result<Option<String>> {
    LineExtractor::new(path).read_line(line)
}

/// Returns the default index location for `source`, which is `source` with `.idx` appended.
pub fn index_path_for<P: AsRef<Path>>(source: P) -> PathBuf {
    let mut path: OsString = source.as_ref().as_os_str().to_owned();
    path.push(INDEX_EXTENSION);
    path.into()
}

/// Strips terminators from the end of a line and a BOM if the line is the first one in the file.
fn clean_line(mut text: String, start: u64) -> String {
    let content_len = text.trim_end_matches(|c: char| c == '\r' || c == '\n').len();
    text.truncate(content_len);

    if start == 0 && text.starts_with(BOM) {
        text.replace_range(..BOM.len_utf8(), "");
    }

    text
}
