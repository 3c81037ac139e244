mod deferred;
mod include;
mod lexical;
mod stack;
mod syntax;

pub use deferred::DeferredParse;
pub use include::IncludeError;
pub use lexical::LexicalError;
pub use stack::{BoxedCause, ErrorStack};
pub use syntax::SyntaxError;
use thiserror::Error;
use miette::Diagnostic;
use crate::label::{BuildLabel, LabelError};
use crate::position::Position;
use crate::source::{OutputLayout, SourceRef};

/// What a parse attempt can end with.
#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    /// Control signal: build a dependency first, then retry.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Deferred(#[from] DeferredParse),

    /// A real failure with its source positions.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Stack(#[from] ErrorStack),
}

impl ParseError {
    pub fn deferred_label(&self) -> Option<&BuildLabel> {
        match self {
            ParseError::Deferred(deferred) => Some(&deferred.label),
            ParseError::Stack(_) => None,
        }
    }

    pub fn as_stack(&self) -> Option<&ErrorStack> {
        match self {
            ParseError::Stack(stack) => Some(stack),
            ParseError::Deferred(_) => None,
        }
    }

    /// The underlying message only. Deferrals report themselves.
    pub fn short_message(&self) -> String {
        match self {
            ParseError::Deferred(deferred) => deferred.to_string(),
            ParseError::Stack(stack) => stack.short_error(),
        }
    }

    /// See [`ErrorStack::add_reader`]. Deferrals are left alone.
    pub fn add_reader(&mut self, reader: &SourceRef, layout: &dyn OutputLayout) {
        if let ParseError::Stack(stack) = self {
            stack.add_reader(reader, layout);
        }
    }

    pub fn with_reader(mut self, reader: &SourceRef, layout: &dyn OutputLayout) -> Self {
        self.add_reader(reader, layout);
        self
    }
}

/// Returns the label to build first if `err` is a deferral.
pub fn requires_subinclude(err: &ParseError) -> Option<&BuildLabel> {
    err.deferred_label()
}

/// Anything that can be handed to [`add_stack_frame`].
#[derive(Debug)]
pub enum Failure {
    Deferred(DeferredParse),
    Stack(ErrorStack),
    Opaque(BoxedCause),
}

impl Failure {
    pub fn opaque<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Failure::from(Box::new(err) as BoxedCause)
    }

    pub fn deferred_label(&self) -> Option<&BuildLabel> {
        match self {
            Failure::Deferred(deferred) => Some(&deferred.label),
            _ => None,
        }
    }
}

impl From<ParseError> for Failure {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Deferred(deferred) => Failure::Deferred(deferred),
            ParseError::Stack(stack) => Failure::Stack(stack),
        }
    }
}

impl From<DeferredParse> for Failure {
    fn from(deferred: DeferredParse) -> Self {
        Failure::Deferred(deferred)
    }
}

impl From<ErrorStack> for Failure {
    fn from(stack: ErrorStack) -> Self {
        Failure::Stack(stack)
    }
}

/// Boxing does not hide a deferral or an existing stack.
impl From<BoxedCause> for Failure {
    fn from(cause: BoxedCause) -> Self {
        let cause = match cause.downcast::<DeferredParse>() {
            Ok(deferred) => return Failure::Deferred(*deferred),
            Err(cause) => cause,
        };
        let cause = match cause.downcast::<ErrorStack>() {
            Ok(stack) => return Failure::Stack(*stack),
            Err(cause) => cause,
        };
        match cause.downcast::<ParseError>() {
            Ok(err) => Failure::from(*err),
            Err(cause) => Failure::Opaque(cause),
        }
    }
}

/// Plain values that are not errors become textual failures.
impl From<String> for Failure {
    fn from(message: String) -> Self {
        Failure::Opaque(message.into())
    }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Failure::Opaque(message.into())
    }
}

macro_rules! opaque_failures {
    ( $( $ty:ty ),* ) => {
        $(
            impl From<$ty> for Failure {
                fn from(err: $ty) -> Self {
                    Failure::opaque(err)
                }
            }
        )*
    };
}

opaque_failures!(LexicalError, SyntaxError, LabelError, IncludeError, std::io::Error);

/// Records that `err` passed through `pos` on its way out.
///
/// Deferrals come back untouched. An existing stack gains `pos` as its new
/// outermost frame unless that frame is on the same line. Anything else
/// starts a new stack with `pos` as its only frame.
pub fn add_stack_frame(pos: Position, err: impl Into<Failure>) -> ParseError {
    match err.into() {
        Failure::Deferred(deferred) => {
            tracing::debug!("passing {} through {pos}", deferred.label);
            ParseError::Deferred(deferred)
        }
        Failure::Stack(mut stack) => {
            if !stack.push_frame(pos) {
                tracing::trace!("collapsed repeated frame on {}", stack.outermost());
            }
            ParseError::Stack(stack)
        }
        Failure::Opaque(cause) => ParseError::Stack(ErrorStack::new(pos, cause)),
    }
}

pub trait ResultExt<T> {
    /// [`add_stack_frame`] for the error side of a result.
    fn at(self, pos: &Position) -> Result<T, ParseError>;
}

impl<T, E: Into<Failure>> ResultExt<T> for Result<T, E> {
    fn at(self, pos: &Position) -> Result<T, ParseError> {
        self.map_err(|err| add_stack_frame(pos.clone(), err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn pos(file: &str, line: usize, column: usize) -> Position {
        Position::new(file, line, column)
    }

    fn label() -> BuildLabel {
        BuildLabel::new("build_defs", "go")
    }

    #[test]
    fn test_wrap_plain_error() {
        let err = add_stack_frame(pos("BUILD", 2, 3), "bad token");
        let stack = err.as_stack().unwrap();
        assert_eq!(stack.frames(), &[pos("BUILD", 2, 3)]);
        assert!(!stack.is_bound(0));
        assert_eq!(err.short_message(), "bad token");
    }

    #[test]
    fn test_wrap_error_value_keeps_cause() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err = add_stack_frame(pos("BUILD", 1, 1), io_err);
        let stack = err.as_stack().unwrap();
        assert_eq!(stack.short_error(), "gone");
        assert!(stack.cause().downcast_ref::<io::Error>().is_some());
    }

    #[test]
    fn test_same_position_twice_is_one_frame() {
        let p = pos("BUILD", 4, 9);
        let err = add_stack_frame(p.clone(), add_stack_frame(p.clone(), "oops"));
        assert_eq!(err.as_stack().unwrap().frames().len(), 1);
    }

    #[test]
    fn test_same_line_other_column_collapses() {
        let err = add_stack_frame(pos("BUILD", 4, 9), "oops");
        let err = add_stack_frame(pos("BUILD", 4, 1), err);
        assert_eq!(err.as_stack().unwrap().frames(), &[pos("BUILD", 4, 9)]);
    }

    #[test]
    fn test_frames_grow_outward() {
        let err = add_stack_frame(pos("a.build", 1, 1), "oops");
        let err = add_stack_frame(pos("b.build", 2, 1), err);
        let err = add_stack_frame(pos("a.build", 1, 1), err);
        let stack = err.as_stack().unwrap();
        assert_eq!(stack.frames().len(), 3);
        assert_eq!(stack.innermost(), &pos("a.build", 1, 1));
        assert_eq!(stack.outermost(), &pos("a.build", 1, 1));
        assert_eq!(stack.frames()[1], pos("b.build", 2, 1));
        assert_eq!(stack.readers.len(), stack.frames.len());
    }

    #[test]
    fn test_deferral_passes_through() {
        let deferred = DeferredParse::new(label());
        let err = add_stack_frame(pos("BUILD", 1, 1), deferred.clone());
        let err = add_stack_frame(pos("other/BUILD", 7, 2), err);
        assert!(err.as_stack().is_none());
        assert_eq!(requires_subinclude(&err), Some(&label()));
        match err {
            ParseError::Deferred(d) => assert_eq!(d, deferred),
            ParseError::Stack(_) => panic!("deferral was wrapped"),
        }
    }

    #[test]
    fn test_boxed_deferral_passes_through() {
        let boxed: BoxedCause = Box::new(DeferredParse::new(label()));
        let err = add_stack_frame(pos("BUILD", 1, 1), boxed);
        assert!(err.as_stack().is_none());
        assert_eq!(requires_subinclude(&err), Some(&label()));

        let boxed: BoxedCause = Box::new(ParseError::from(DeferredParse::new(label())));
        let err = add_stack_frame(pos("BUILD", 1, 1), boxed);
        assert_eq!(err.deferred_label(), Some(&label()));

        let failure = Failure::opaque(DeferredParse::new(label()));
        assert_eq!(failure.deferred_label(), Some(&label()));
    }

    #[test]
    fn test_boxed_stack_keeps_its_frames() {
        let err = add_stack_frame(pos("a", 1, 1), "oops");
        let err = add_stack_frame(pos("b", 2, 1), err);
        let ParseError::Stack(stack) = err else {
            panic!("expected a stack");
        };
        let boxed: BoxedCause = Box::new(stack);
        let err = add_stack_frame(pos("c", 3, 1), boxed);
        let stack = err.as_stack().unwrap();
        assert_eq!(stack.frames(), &[pos("a", 1, 1), pos("b", 2, 1), pos("c", 3, 1)]);
        assert_eq!(stack.short_error(), "oops");

        let boxed: BoxedCause = Box::new(add_stack_frame(pos("a", 1, 1), "inner"));
        let err = add_stack_frame(pos("b", 2, 1), boxed);
        assert_eq!(err.as_stack().unwrap().frames().len(), 2);
        assert_eq!(err.short_message(), "inner");
    }

    #[test]
    fn test_boxed_plain_error_is_opaque() {
        let boxed: BoxedCause = Box::new(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = add_stack_frame(pos("BUILD", 1, 1), boxed);
        assert_eq!(err.as_stack().unwrap().frames().len(), 1);
        assert_eq!(err.short_message(), "gone");
    }

    #[test]
    fn test_requires_subinclude_on_failures() {
        let err = add_stack_frame(pos("BUILD", 1, 1), "oops");
        assert_eq!(requires_subinclude(&err), None);
        let failure = Failure::from(DeferredParse::new(label()));
        assert_eq!(failure.deferred_label(), Some(&label()));
    }

    #[test]
    fn test_deferral_message() {
        let err = ParseError::from(DeferredParse::new(label()));
        assert_eq!(err.to_string(), "Requires build of //build_defs:go");
        assert_eq!(err.short_message(), "Requires build of //build_defs:go");
    }

    #[test]
    fn test_result_ext() {
        let result: Result<(), &str> = Err("nope");
        let err = result.at(&pos("BUILD", 3, 3)).unwrap_err();
        assert_eq!(err.as_stack().unwrap().frames(), &[pos("BUILD", 3, 3)]);
        let ok: Result<u8, &str> = Ok(1);
        assert_eq!(ok.at(&pos("BUILD", 3, 3)).unwrap(), 1);
    }

    #[test]
    fn test_add_reader_ignores_deferral() {
        let reader = crate::source::shared(crate::source::NamedReader::from_source("BUILD", "x"));
        let err = ParseError::from(DeferredParse::new(label()))
            .with_reader(&reader, &crate::source::GenDirLayout::default());
        assert_eq!(err.deferred_label(), Some(&label()));
    }
}
