use thiserror::Error;
use miette::Diagnostic;
use crate::label::BuildLabel;

/// Not a failure: parsing has to pause until `label` is built, then retry.
///
/// Never carries a stack trace and is never wrapped.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
#[error("Requires build of {label}")]
#[diagnostic(
    code(asp::deferred),
    help("Build {label} and parse this package again.")
)]
pub struct DeferredParse {
    pub label: BuildLabel,
}

impl DeferredParse {
    pub fn new(label: BuildLabel) -> Self {
        Self { label }
    }
}
