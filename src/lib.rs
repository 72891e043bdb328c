//!A simple library to read single lines of large text files using a pregenerated line index
//!
//! The index is stored next to the text file (`<file>.idx`) and built on first access. It holds
//! the byte offset of every line, so later reads seek directly to the requested line.
//!
//! ```no_run
//! use indexed_lines::LineExtractor;
//!
//! let extractor = LineExtractor::new("huge.txt");
//! match extractor.read_line(30).unwrap() {
//!     Some(line) => println!("{}", line),
//!     None => eprintln!("no such line"),
//! }
//! ```

/// Single pass index builder
pub mod builder;
pub mod error;
/// Line extraction on top of the index
pub mod extract;
/// Seek based lookups in existing indices
pub mod index;
/// Fixed width encoding of byte offsets
pub mod offset;
pub mod span;
/// Byte-wise UTF-8 decoding
pub mod utf8;

pub use builder::{BuildSummary, LineIndexBuilder};
pub use error::Error;
pub use extract::{extract_line, index_path_for, LineExtractor};
pub use index::LineIndexReader;
pub use offset::ByteOffset;
pub use span::LineSpan;
pub use utf8::Utf8CharReader;

pub type Result<T> = std::result::Result<T, error::Error>;

#[cfg(test)]
mod tests {
    use rand::{distributions::Uniform, Rng};

    use super::*;
    use std::{fs, path::Path};

    /// Copies a file of `./testfiles` into a fresh directory, so the index doesn't end up in the
    /// repository.
    fn scratch_copy(name: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(name);
        fs::copy(Path::new("./testfiles").join(name), &target).expect("missing test file");
        (dir, target)
    }

    /// Splits `text` the way the index does: at `\n`, `\r` and `\r\n`, without an extra line after a
    /// final terminator. A leading BOM is dropped.
    fn expected_lines(text: &str) -> Vec<String> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut lines = Vec::new();
        let mut current = String::new();
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    lines.push(std::mem::take(&mut current));
                }
                '\n' => lines.push(std::mem::take(&mut current)),
                c => current.push(c),
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    #[test]
    fn test() {
        let input_files = &["simple", "crlf", "mixed", "bom", "unicode"];

        for input_file in input_files {
            let (_dir, file) = scratch_copy(input_file);
            let expected = expected_lines(&fs::read_to_string(&file).unwrap());

            // First access builds the index, afterwards it gets used
            let extractor = LineExtractor::new(&file);
            test_sequencially(&extractor, &expected);
            assert!(extractor.has_index().unwrap());
            test_sequencially(&extractor, &expected);
            test_random(&extractor, &expected);

            assert_eq!(extractor.total_lines().unwrap(), expected.len() as u64);
            assert_eq!(
                fs::metadata(extractor.index_path()).unwrap().len(),
                6 * (expected.len() as u64 + 1)
            );
        }
    }

    fn test_sequencially(extractor: &LineExtractor, expected: &[String]) {
        for (line, original) in expected.iter().enumerate() {
            let read = extractor.read_line(line);

            assert!(read.is_ok());
            assert_eq!(Some(original), read.unwrap().as_ref());
        }

        assert_eq!(extractor.read_line(expected.len()).unwrap(), None);
    }

    fn test_random(extractor: &LineExtractor, expected: &[String]) {
        let lines: Vec<_> = rand::thread_rng()
            .sample_iter(Uniform::new(0, expected.len()))
            .take(expected.len() * 3)
            .collect();

        for line in lines {
            let original = expected.get(line).unwrap();
            let read = extractor.read_line(line);

            assert!(read.is_ok());
            assert_eq!(Some(original), read.unwrap().as_ref());
        }
    }

    #[test]
    fn test_crlf_matches_lf() {
        let (_a, lf) = scratch_copy("simple");
        let (_b, crlf) = scratch_copy("crlf");

        let lf = LineExtractor::new(lf);
        let crlf = LineExtractor::new(crlf);

        let total = lf.total_lines().unwrap();
        assert_eq!(total, crlf.total_lines().unwrap());
        for line in 0..total as usize {
            assert_eq!(lf.read_line(line).unwrap(), crlf.read_line(line).unwrap());
        }
    }

    #[test]
    fn test_build_matches_scan() {
        let (_dir, file) = scratch_copy("mixed");

        // Spans found by the scan while building, one build per line
        let index_path = file.with_extension("scan.idx");
        let mut line = 0;
        let mut scanned = Vec::new();
        loop {
            let summary = LineIndexBuilder::build_file(&file, &index_path, Some(line)).unwrap();
            match summary.target {
                Some(span) => scanned.push(span),
                None => break,
            }
            line += 1;
        }

        let mut index = LineIndexReader::open(&index_path).unwrap();
        assert_eq!(index.spans().unwrap(), scanned);

        for (line, span) in scanned.iter().enumerate() {
            assert_eq!(index.lookup(line).unwrap(), Some(*span));
        }

        // Raw bytes are identical, terminators included
        let content = fs::read(&file).unwrap();
        let extractor = LineExtractor::new(&file).with_index_path(&index_path);
        for (line, span) in scanned.iter().enumerate() {
            let mut buf = Vec::new();
            extractor.read_line_raw(line, &mut buf).unwrap();
            let range = span.start as usize..span.end() as usize;
            assert_eq!(buf, &content[range]);
        }
    }

    #[test]
    fn test_empty() {
        let (_dir, file) = scratch_copy("empty");
        let extractor = LineExtractor::new(&file);
        assert_eq!(extractor.read_line(0).unwrap(), None);
        assert_eq!(extractor.total_lines().unwrap(), 0);
    }
}
