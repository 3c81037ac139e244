use std::io;
use std::path::PathBuf;
use thiserror::Error;
use miette::Diagnostic;

/// Failures getting at a BUILD file's contents, either the one asked for or
/// one it includes. Failures inside the file are reported separately.
#[derive(Debug, Error, Diagnostic)]
#[diagnostic(code(asp::include))]
pub enum IncludeError {
    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Includes nested more than {limit} levels deep")]
    #[diagnostic(help("Check for a file that (indirectly) includes itself."))]
    TooDeep { limit: usize },
}
