use thiserror::Error;
use miette::{Diagnostic, SourceSpan};
use crate::lexer::Token;
use crate::position::Span;

#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
#[diagnostic(
    // a code for all lexical errors
    code(asp::lexer)
)]
pub enum LexicalError {
    #[error("Unexpected character '{bad_char}'")]
    #[diagnostic(help("The character '{bad_char}' is not recognized here."))]
    UnexpectedCharacter {
        bad_char: char,
        #[label("Unexpected character")]
        span: SourceSpan,
    },

    #[error("Unterminated string literal")]
    #[diagnostic(help("Strings must be closed with '\"' on the line they start on."))]
    UnterminatedString {
        #[label("This string is never closed")]
        span: SourceSpan,
    },
}

impl LexicalError {
    /// Turns the text logos rejected at `span` into an error.
    pub fn rejected(reason: &'static str, slice: &str, span: Span) -> LexicalError {
        let span = span.into();
        if reason == Token::UNTERMINATED {
            return LexicalError::UnterminatedString { span };
        }
        let bad_char = slice.chars().next().unwrap_or('?');
        LexicalError::UnexpectedCharacter { bad_char, span }
    }

    pub fn span(&self) -> SourceSpan {
        match self {
            LexicalError::UnexpectedCharacter { span, .. } => *span,
            LexicalError::UnterminatedString { span } => *span,
        }
    }
}
