//! Source readers that diagnostics use to recover the text around a frame.
//!
//! A reader is anything seekable and readable; it may also carry a logical
//! name, which lets in-memory buffers (not yet flushed to disk) be matched
//! against the filenames recorded in stack frames.

use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use parking_lot::Mutex;

/// Default directory that generated copies of sources are written into.
pub const DEFAULT_GEN_DIR: &str = "plz-out/gen";

/// A seekable source of file contents, optionally with a logical name.
pub trait SourceReader: Read + Seek + Send {
    /// Logical name of the source, if it differs from (or replaces) a path.
    fn name(&self) -> Option<&str> {
        None
    }
}

impl SourceReader for File {}

impl<T: AsRef<[u8]> + Send> SourceReader for Cursor<T> {}

/// Shared handle to a reader. A diagnostic keeps one of these per frame; the
/// original owner is free to drop its own handle.
pub type SourceRef = Arc<Mutex<dyn SourceReader>>;

/// Wraps a reader so it can go into a diagnostic.
pub fn shared<R: SourceReader + 'static>(reader: R) -> SourceRef {
    Arc::new(Mutex::new(reader))
}

/// Attaches a logical name to a reader.
#[derive(Debug)]
pub struct NamedReader<R> {
    inner: R,
    name: String,
}

impl<R> NamedReader<R> {
    pub fn new(inner: R, name: impl Into<String>) -> Self {
        Self {
            inner,
            name: name.into(),
        }
    }
}

impl NamedReader<Cursor<Vec<u8>>> {
    /// An in-memory buffer standing in for the file `name`.
    pub fn from_source(name: impl Into<String>, source: impl Into<Vec<u8>>) -> Self {
        Self::new(Cursor::new(source.into()), name)
    }
}

impl<R: Read> Read for NamedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Seek> Seek for NamedReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl<R: Read + Seek + Send> SourceReader for NamedReader<R> {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// One line of source plus its neighbours. Missing neighbours are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineContext {
    pub before: String,
    pub line: String,
    pub after: String,
}

impl LineContext {
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.line.is_empty() && self.after.is_empty()
    }
}

/// Reads the 0-based line `index` and its neighbours from `reader`.
///
/// Any failure (no reader, I/O error, line out of range) gives an empty
/// context; callers treat that as "source unavailable".
pub fn read_context(reader: Option<&SourceRef>, index: usize) -> LineContext {
    let Some(reader) = reader else {
        return LineContext::default();
    };
    let mut contents = Vec::new();
    let read = {
        let mut guard = reader.lock();
        guard
            .seek(SeekFrom::Start(0))
            .and_then(|_| guard.read_to_end(&mut contents))
    };
    if let Err(e) = read {
        tracing::trace!("failed to read source for diagnostic: {e}");
        return LineContext::default();
    }
    let lines: Vec<&[u8]> = contents.split(|&b| b == b'\n').collect();
    if lines.len() <= index {
        return LineContext::default();
    }
    let text = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();
    LineContext {
        before: if index > 0 { text(lines[index - 1]) } else { String::new() },
        line: text(lines[index]),
        after: lines.get(index + 1).map(|l| text(l)).unwrap_or_default(),
    }
}

/// Where the build system writes generated files, and how to tell whether a
/// generated file is just a copy of a checked-in source.
pub trait OutputLayout {
    fn gen_dir(&self) -> &str;

    fn is_same_file(&self, a: &Path, b: &Path) -> bool;
}

/// Layout with a fixed generated-output prefix, comparing files byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenDirLayout {
    gen_dir: String,
}

impl GenDirLayout {
    pub fn new(gen_dir: impl Into<String>) -> Self {
        let gen_dir: String = gen_dir.into();
        Self {
            gen_dir: gen_dir.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for GenDirLayout {
    fn default() -> Self {
        Self::new(DEFAULT_GEN_DIR)
    }
}

impl OutputLayout for GenDirLayout {
    fn gen_dir(&self) -> &str {
        &self.gen_dir
    }

    fn is_same_file(&self, a: &Path, b: &Path) -> bool {
        match (fs::read(a), fs::read(b)) {
            (Ok(x), Ok(y)) => x == y,
            _ => false,
        }
    }
}
