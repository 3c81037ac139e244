//! Diagnostics for a BUILD-language interpreter.
//!
//! Failures are wrapped into an [`ErrorStack`] at every call boundary they
//! cross, gain source readers as files become available, and are finally
//! rendered as an annotated message plus traceback. A [`DeferredParse`] is
//! not a failure: it asks the caller to build a label and retry, and passes
//! through every layer untouched.

pub mod driver;
pub mod errors;
pub mod label;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod render;
pub mod source;

pub use driver::{parse_files, pending_labels, FileReport};
pub use errors::{
    add_stack_frame, requires_subinclude, DeferredParse, ErrorStack, Failure, ParseError,
    ResultExt,
};
pub use label::BuildLabel;
pub use parser::{parse_file, parse_source, Package, ParseOptions};
pub use position::Position;
pub use render::FormatConfig;
pub use source::{GenDirLayout, NamedReader, OutputLayout, SourceReader, SourceRef};
