use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};
use std::fs::File;
use std::path::Path;
use miette::Diagnostic;
use super::{IncludeError, LexicalError, SyntaxError};
use crate::label::LabelError;
use crate::position::Position;
use crate::render::FormatConfig;
use crate::source::{self, OutputLayout, SourceRef};

pub type BoxedCause = Box<dyn Error + Send + Sync + 'static>;

/// A failure carrying the chain of source positions it passed through.
///
/// `frames[0]` is the innermost position (where the failure happened); the
/// last frame is the outermost call site. `readers` is index-aligned with
/// `frames` and any entry may stay unbound forever.
pub struct ErrorStack {
    pub(crate) frames: Vec<Position>,
    pub(crate) readers: Vec<Option<SourceRef>>,
    pub(crate) cause: BoxedCause,
}

impl ErrorStack {
    pub fn new(pos: Position, cause: BoxedCause) -> Self {
        Self {
            frames: vec![pos],
            readers: vec![None],
            cause,
        }
    }

    pub fn frames(&self) -> &[Position] {
        &self.frames
    }

    pub fn innermost(&self) -> &Position {
        &self.frames[0]
    }

    pub fn outermost(&self) -> &Position {
        &self.frames[self.frames.len() - 1]
    }

    /// Whether frame `index` has a source reader attached.
    pub fn is_bound(&self, index: usize) -> bool {
        matches!(self.readers.get(index), Some(Some(_)))
    }

    pub fn cause(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    /// Just what immediately went wrong, without positions or context.
    pub fn short_error(&self) -> String {
        self.cause.to_string()
    }

    /// The cause as a diagnostic, when it is one of ours.
    fn cause_diagnostic(&self) -> Option<&dyn Diagnostic> {
        let cause = self.cause();
        cause
            .downcast_ref::<SyntaxError>()
            .map(|d| d as &dyn Diagnostic)
            .or_else(|| cause.downcast_ref::<LexicalError>().map(|d| d as &dyn Diagnostic))
            .or_else(|| cause.downcast_ref::<LabelError>().map(|d| d as &dyn Diagnostic))
            .or_else(|| cause.downcast_ref::<IncludeError>().map(|d| d as &dyn Diagnostic))
    }

    /// Appends an outer frame. Returns false when `pos` is on the same line
    /// as the last frame added, in which case nothing changes.
    pub(crate) fn push_frame(&mut self, pos: Position) -> bool {
        if self.outermost().same_line(&pos) {
            return false;
        }
        self.frames.push(pos);
        self.readers.push(None);
        true
    }

    /// Offers `reader` to every frame that has no source yet.
    ///
    /// Frames whose filename matches the reader's name take it directly.
    /// Others are opened from disk if possible; a frame pointing into the
    /// generated-output directory is renamed to the checked-in source when
    /// the two files are identical.
    pub fn add_reader(&mut self, reader: &SourceRef, layout: &dyn OutputLayout) {
        let name = reader.lock().name().map(str::to_owned);
        let gen_prefix = format!("{}/", layout.gen_dir());
        for (frame, slot) in self.frames.iter_mut().zip(self.readers.iter_mut()) {
            if slot.is_some() {
                continue;
            }
            if name.as_deref() == Some(frame.filename.as_str()) {
                *slot = Some(reader.clone());
                continue;
            }
            // Maybe it's just a file on disk (e.g. reached via an include)
            match File::open(&frame.filename) {
                Ok(file) => {
                    tracing::debug!("bound {} from disk", frame.filename);
                    *slot = Some(source::shared(file));
                    if let Some(stripped) = frame.filename.strip_prefix(&gen_prefix) {
                        if layout.is_same_file(Path::new(&frame.filename), Path::new(stripped)) {
                            tracing::debug!("showing {} as {stripped}", frame.filename);
                            frame.filename = stripped.to_string();
                        }
                    }
                }
                Err(e) => tracing::trace!("no source for {}: {e}", frame.filename),
            }
        }
    }
}

impl Debug for ErrorStack {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let bound: Vec<bool> = self.readers.iter().map(Option::is_some).collect();
        f.debug_struct("ErrorStack")
            .field("frames", &self.frames)
            .field("bound", &bound)
            .field("cause", &self.cause)
            .finish()
    }
}

impl Display for ErrorStack {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&FormatConfig::plain()))
    }
}

impl Error for ErrorStack {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

impl Diagnostic for ErrorStack {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new("asp::error_stack"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.cause_diagnostic().and_then(|d| d.help())
    }
}
