//! Parser and evaluator for BUILD files.
//!
//! A file is a flat list of calls:
//!
//! ```text
//! file  := call*
//! call  := IDENT "(" [arg ("," arg)* [","]] ")"
//! arg   := [IDENT "="] value
//! value := STRING | IDENT | "[" [value ("," value)* [","]] "]"
//! ```
//!
//! `include`, `subinclude` and `fail` are evaluated here; every other call
//! is recorded as a rule. Failures leave each file with its position added
//! and its source attached, so the final report can show every level.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use chumsky::input::IterInput;
use chumsky::prelude::*;
use crate::errors::{
    add_stack_frame, DeferredParse, IncludeError, ParseError, ResultExt, SyntaxError,
};
use crate::label::BuildLabel;
use crate::lexer::{Lexer, Token, TokenStream};
use crate::position::{LineIndex, Position, Span};
use crate::source::{shared, GenDirLayout, NamedReader};

/// How deep `include` may nest before we assume a cycle.
pub const MAX_INCLUDE_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Ident(String),
    List(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Value,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Arg>,
    pub pos: Position,
}

/// Everything a successful parse produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    /// Files read, in the order they were entered.
    pub files: Vec<String>,
    pub rules: Vec<Call>,
}

#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Labels that are already built; `subinclude` of anything else defers.
    pub built: HashSet<BuildLabel>,
    pub layout: GenDirLayout,
}

type ParserError<'tokens> = Rich<'tokens, Token, Span>;
type ParserInput<'tokens> = IterInput<TokenStream<'tokens>, Span>;
type ParserUtils<'tokens> = extra::Err<ParserError<'tokens>>;

/// `impl Parser<..>` over our token stream, producing `$output`.
macro_rules! ParserOutput {
    ($output:ty) => {
        impl chumsky::Parser<'tokens, ParserInput<'tokens>, $output, ParserUtils<'tokens>> + Clone
    };
}

fn ident<'tokens>() -> ParserOutput!(String) {
    select! {
        Token::Identifier(name) => name,
    }
    .labelled("identifier")
}

/// value = STRING | IDENT | "[" [value ("," value)* [","]] "]"
fn value<'tokens>() -> ParserOutput!(Value) {
    recursive(|value| {
        let list = value
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(Value::List);
        select! {
            Token::Str(s) => Value::Str(s),
            Token::Identifier(name) => Value::Ident(name),
        }
        .or(list)
    })
    .labelled("a value")
}

/// call = IDENT "(" [arg ("," arg)* [","]] ")"
fn call<'tokens>(index: &'tokens LineIndex) -> ParserOutput!(Call) {
    let arg = ident()
        .then_ignore(just(Token::Assign))
        .or_not()
        .then(value())
        .map_with(move |(name, value), extra| Arg {
            name,
            value,
            pos: index.span_start(extra.span()),
        });

    ident()
        .then(
            arg.separated_by(just(Token::Comma))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        )
        .map_with(move |(name, args), extra| Call {
            name,
            args,
            pos: index.span_start(extra.span()),
        })
        .labelled("a function call")
}

fn file<'tokens>(index: &'tokens LineIndex) -> ParserOutput!(Vec<Call>) {
    call(index).repeated().collect::<Vec<_>>().then_ignore(end())
}

/// Parses `source` into calls without evaluating anything.
///
/// Lexical errors come first: text the lexer rejected usually explains
/// whatever the parser tripped over afterwards.
pub fn parse_calls(filename: &str, source: &str) -> Result<Vec<Call>, ParseError> {
    let index = LineIndex::new(filename, source);
    let lexer = Lexer::new(source);
    let lexical_errors = lexer.errors();
    let eoi_span = Span::new(source.len(), source.len());
    let input = IterInput::new(lexer.into_stream(), eoi_span);

    let (calls, parse_errors) = file(&index).parse(input).into_output_errors();

    let first_lexical = lexical_errors.borrow().first().cloned();
    if let Some(err) = first_lexical {
        return Err(add_stack_frame(index.position(err.span().offset()), err));
    }
    if let Some(err) = parse_errors.into_iter().next() {
        let err = SyntaxError::from(err);
        return Err(add_stack_frame(index.position(err.offset()), err));
    }
    Ok(calls.unwrap_or_default())
}

/// Parses and evaluates the file at `path`.
pub fn parse_file(path: &Path, options: &ParseOptions) -> Result<Package, ParseError> {
    let source = fs::read_to_string(path).map_err(|source| IncludeError::Read {
        path: path.to_path_buf(),
        source,
    });
    let filename = path.display().to_string();
    let source = source.at(&Position::new(filename.clone(), 1, 1))?;
    parse_source(&filename, &source, options)
}

/// Parses and evaluates `source` as if it were the file `filename`.
pub fn parse_source(filename: &str, source: &str, options: &ParseOptions) -> Result<Package, ParseError> {
    let mut package = Package::default();
    Interpreter { options }.exec_source(filename, source, 0, &mut package)?;
    Ok(package)
}

struct Interpreter<'a> {
    options: &'a ParseOptions,
}

impl Interpreter<'_> {
    fn exec_source(&self, filename: &str, source: &str, depth: usize, package: &mut Package) -> Result<(), ParseError> {
        package.files.push(filename.to_string());
        self.exec_calls(filename, source, depth, package).map_err(|err| {
            let reader = shared(NamedReader::from_source(filename, source));
            err.with_reader(&reader, &self.options.layout)
        })
    }

    fn exec_calls(&self, filename: &str, source: &str, depth: usize, package: &mut Package) -> Result<(), ParseError> {
        let base = Path::new(filename).parent().unwrap_or(Path::new(""));
        for call in parse_calls(filename, source)? {
            match call.name.as_str() {
                "include" => self.include(&call, base, depth, package)?,
                "subinclude" => self.subinclude(&call)?,
                "fail" => {
                    let message = string_args(&call)?.join(" ");
                    return Err(add_stack_frame(call.pos, message));
                }
                _ => package.rules.push(call),
            }
        }
        Ok(())
    }

    fn include(&self, call: &Call, base: &Path, depth: usize, package: &mut Package) -> Result<(), ParseError> {
        if depth + 1 > MAX_INCLUDE_DEPTH {
            return Err(add_stack_frame(call.pos.clone(), IncludeError::TooDeep { limit: MAX_INCLUDE_DEPTH }));
        }
        for file in string_args(call)? {
            let path = base.join(file);
            let source = fs::read_to_string(&path)
                .map_err(|source| IncludeError::Read { path: path.clone(), source })
                .at(&call.pos)?;
            let filename = path.display().to_string();
            tracing::trace!("including {filename}");
            self.exec_source(&filename, &source, depth + 1, package)
                .at(&call.pos)?;
        }
        Ok(())
    }

    fn subinclude(&self, call: &Call) -> Result<(), ParseError> {
        for arg in &call.args {
            let Value::Str(text) = &arg.value else {
                return Err(add_stack_frame(arg.pos.clone(), "subinclude() takes build labels as strings"));
            };
            let label = text.parse::<BuildLabel>().at(&arg.pos)?;
            if !self.options.built.contains(&label) {
                tracing::debug!("{} needs {label}", call.pos);
                return Err(add_stack_frame(call.pos.clone(), DeferredParse::new(label)));
            }
        }
        Ok(())
    }
}

/// Positional string arguments of a builtin.
fn string_args(call: &Call) -> Result<Vec<&str>, ParseError> {
    call.args
        .iter()
        .map(|arg| match (&arg.name, &arg.value) {
            (None, Value::Str(s)) => Ok(s.as_str()),
            _ => Err(add_stack_frame(
                arg.pos.clone(),
                format!("{}() only takes positional string arguments", call.name),
            )),
        })
        .collect()
}
