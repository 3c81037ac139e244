use logos::{Lexer, Logos};
use std::fmt::{self, Display, Formatter};

fn parse_string(lex: &mut Lexer<Token>) -> Result<String, &'static str> {
    let slice = lex.slice();
    // strip the quotes
    let body = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => return Err(Token::UNTERMINATED),
        }
    }
    Ok(out)
}

fn unterminated(_: &mut Lexer<Token>) -> Result<String, &'static str> {
    Err(Token::UNTERMINATED)
}

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(error = &'static str)]
pub enum Token {
    // --- Literals ---
    #[regex(r#""([^"\\\n]|\\.)*""#, parse_string)]
    #[regex(r#""([^"\\\n]|\\.)*"#, unterminated)]
    Str(String),

    #[regex("[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // --- Delimiters ---
    #[token("=")]
    Assign,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,

    // --- Comments & Whitespace ---
    #[regex(r"#[^\n]*", logos::skip)]
    #[regex(r"[ \t\n\f\r]+", logos::skip)]
    Whitespace,
}

impl Token {
    /// Error reason for a string with no closing quote.
    pub const UNTERMINATED: &'static str = "unterminated string";

    /// Human readable description, used in syntax errors.
    pub fn describe(&self) -> String {
        match self {
            Token::Str(s) => format!("\"{s}\""),
            Token::Identifier(name) => name.clone(),
            other => other.to_string(),
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Token::Str(_) => write!(f, "string"),
            Token::Identifier(_) => write!(f, "identifier"),
            Token::Assign => write!(f, "="),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Whitespace => write!(f, "whitespace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexer_full() {
        let input = r#"
            # load some rules
            subinclude("//build_defs:go")

            go_library(
                name = "errors",
                srcs = ["errors.go", "a\"b.go"],
            )
        "#;

        let mut lexer = Token::lexer(input);

        // --- subinclude("//build_defs:go") ---
        assert_eq!(lexer.next(), Some(Ok(Token::Identifier("subinclude".to_string()))));
        assert_eq!(lexer.next(), Some(Ok(Token::LParen)));
        assert_eq!(lexer.next(), Some(Ok(Token::Str("//build_defs:go".to_string()))));
        assert_eq!(lexer.next(), Some(Ok(Token::RParen)));

        // --- go_library( ---
        assert_eq!(lexer.next(), Some(Ok(Token::Identifier("go_library".to_string()))));
        assert_eq!(lexer.next(), Some(Ok(Token::LParen)));

        // --- name = "errors", ---
        assert_eq!(lexer.next(), Some(Ok(Token::Identifier("name".to_string()))));
        assert_eq!(lexer.next(), Some(Ok(Token::Assign)));
        assert_eq!(lexer.next(), Some(Ok(Token::Str("errors".to_string()))));
        assert_eq!(lexer.next(), Some(Ok(Token::Comma)));

        // --- srcs = ["errors.go", "a\"b.go"], ---
        assert_eq!(lexer.next(), Some(Ok(Token::Identifier("srcs".to_string()))));
        assert_eq!(lexer.next(), Some(Ok(Token::Assign)));
        assert_eq!(lexer.next(), Some(Ok(Token::LBracket)));
        assert_eq!(lexer.next(), Some(Ok(Token::Str("errors.go".to_string()))));
        assert_eq!(lexer.next(), Some(Ok(Token::Comma)));
        assert_eq!(lexer.next(), Some(Ok(Token::Str("a\"b.go".to_string()))));
        assert_eq!(lexer.next(), Some(Ok(Token::RBracket)));
        assert_eq!(lexer.next(), Some(Ok(Token::Comma)));

        // --- ) ---
        assert_eq!(lexer.next(), Some(Ok(Token::RParen)));

        // --- End of input ---
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Token::lexer("x(\"abc\n)");
        assert_eq!(lexer.next(), Some(Ok(Token::Identifier("x".to_string()))));
        assert_eq!(lexer.next(), Some(Ok(Token::LParen)));
        assert_eq!(lexer.next(), Some(Err(Token::UNTERMINATED)));
        assert_eq!(lexer.span(), 2..6);
    }

    #[test]
    fn test_unknown_character() {
        let mut lexer = Token::lexer("a ; b");
        assert_eq!(lexer.next(), Some(Ok(Token::Identifier("a".to_string()))));
        assert!(matches!(lexer.next(), Some(Err(_))));
        assert_eq!(lexer.slice(), ";");
        assert_eq!(lexer.next(), Some(Ok(Token::Identifier("b".to_string()))));
    }
}
