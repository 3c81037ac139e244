use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use miette::Diagnostic;

/// Reference to a build target, `//package:name`.
///
/// Only ever compared and printed by this crate; resolving what a label
/// points at belongs to the build graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildLabel {
    pub package: String,
    pub name: String,
}

impl BuildLabel {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }
}

impl Display for BuildLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "//{}:{}", self.package, self.name)
    }
}

#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
#[diagnostic(code(asp::label))]
pub enum LabelError {
    #[error("Invalid build label '{0}': labels must start with //")]
    #[diagnostic(help("Write absolute labels, like '//package:target'."))]
    NotAbsolute(String),

    #[error("Invalid build label '{0}': empty target name")]
    EmptyName(String),

    #[error("Invalid build label '{0}': unexpected character '{1}'")]
    BadCharacter(String, char),
}

fn valid_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | '+' | '#')
}

impl FromStr for BuildLabel {
    type Err = LabelError;

    /// Accepts `//pkg:name` and the short form `//pkg/sub`, which names the
    /// target after the last package component.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("//")
            .ok_or_else(|| LabelError::NotAbsolute(s.to_string()))?;
        let (package, name) = match rest.split_once(':') {
            Some((package, name)) => (package, name),
            None => (rest, rest.rsplit('/').next().unwrap_or(rest)),
        };
        if name.is_empty() {
            return Err(LabelError::EmptyName(s.to_string()));
        }
        if let Some(bad) = package.chars().chain(name.chars()).find(|&c| !valid_char(c)) {
            return Err(LabelError::BadCharacter(s.to_string(), bad));
        }
        Ok(BuildLabel::new(package, name))
    }
}
