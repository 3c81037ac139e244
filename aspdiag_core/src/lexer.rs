mod tokens;

use std::cell::RefCell;
use std::rc::Rc;
use logos::{Logos, SpannedIter};
use crate::errors::LexicalError;
pub use tokens::Token;
use crate::position::Span;

/// Lexical errors seen so far, in source order.
pub type LexicalErrors = Rc<RefCell<Vec<LexicalError>>>;

/// A streaming token iterator that filters out and collects lexical errors.
#[derive(Clone)]
pub struct TokenStream<'s> {
    lexer: SpannedIter<'s, Token>,
    errors: LexicalErrors,
}

impl<'s> TokenStream<'s> {
    /// Creates a new TokenStream from a source string.
    pub fn new(source: &'s str, errors: LexicalErrors) -> Self {
        Self {
            lexer: Token::lexer(source).spanned(),
            errors,
        }
    }
}

impl<'s> Iterator for TokenStream<'s> {
    // Only valid tokens come out; rejected text goes to the error list.
    type Item = (Token, Span);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (result, range) = self.lexer.next()?;
            let span = Span::from(range);
            match result {
                Ok(token) => return Some((token, span)),
                Err(reason) => {
                    let mut errors = self.errors.borrow_mut();
                    // a rewound clone lexes the same text again
                    if errors.last().map_or(true, |last| last.span().offset() < span.start()) {
                        errors.push(LexicalError::rejected(reason, self.lexer.slice(), span));
                    }
                }
            }
        }
    }
}

pub struct Lexer<'s> {
    stream: TokenStream<'s>,
    errors: LexicalErrors,
}

impl<'s> Lexer<'s> {
    /// Creates a new Lexer from a source string.
    pub fn new(source: &'s str) -> Self {
        let errors = LexicalErrors::default();
        Self {
            stream: TokenStream::new(source, Rc::clone(&errors)),
            errors,
        }
    }

    /// Handle to the errors the stream collects while it is consumed.
    pub fn errors(&self) -> LexicalErrors {
        Rc::clone(&self.errors)
    }

    /// Consumes the Lexer and returns the underlying TokenStream.
    pub fn into_stream(self) -> TokenStream<'s> {
        self.stream
    }
}
