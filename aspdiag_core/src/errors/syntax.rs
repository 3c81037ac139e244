use thiserror::Error;
use miette::{Diagnostic, SourceSpan};
use chumsky::error::Rich;
use crate::lexer::Token;
use crate::position::Span;

#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
#[error("{message}")]
#[diagnostic(code(asp::syntax))]
pub struct SyntaxError {
    /// the core message
    message: String,

    /// where the parser gave up
    #[label]
    span: SourceSpan,

    /// what would have been accepted instead, if anything
    #[help]
    help_text: Option<String>,
}

impl SyntaxError {
    /// An unexpected token (or end of input, when `found` is `None`).
    pub fn unexpected(found: Option<&str>, expected: &[&str], span: Span) -> Self {
        let found_str = found
            .map(|t| format!("'{t}'"))
            .unwrap_or_else(|| "end of input".to_string());
        let help_text = match expected {
            [] => None,
            [one] => Some(format!("Expected {one} here.")),
            many => Some(format!("Try one of these instead: {}", many.join(", "))),
        };
        SyntaxError {
            message: format!("Unexpected {found_str}"),
            span: span.into(),
            help_text,
        }
    }

    /// Byte offset the error points at.
    pub fn offset(&self) -> usize {
        self.span.offset()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help_text.as_deref()
    }
}

impl<'a> From<Rich<'a, Token, Span>> for SyntaxError {
    fn from(err: Rich<'a, Token, Span>) -> Self {
        let found = err.found().map(Token::describe);
        let expected: Vec<String> = err.expected().map(ToString::to_string).collect();
        let expected: Vec<&str> = expected.iter().map(String::as_str).collect();
        SyntaxError::unexpected(found.as_deref(), &expected, *err.span())
    }
}
