//! Text rendering of [`ErrorStack`]s: the annotated message for the
//! outermost frame followed by an aligned traceback.

use crate::errors::ErrorStack;
use crate::position::Position;
use crate::source::read_context;

// ANSI formatting codes
const RESET: &str = "\x1b[0m";
const BOLD_RED: &str = "\x1b[31;1m";
const BOLD_WHITE: &str = "\x1b[37;1m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const WHITE: &str = "\x1b[37m";
const GREY: &str = "\x1b[30m";

const SOURCE_UNAVAILABLE: &str = "<source unavailable>";

/// How to render diagnostics. Terminal detection is up to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatConfig {
    pub colorize: bool,
}

impl FormatConfig {
    pub fn plain() -> Self {
        Self { colorize: false }
    }

    pub fn colored() -> Self {
        Self { colorize: true }
    }

    pub fn for_terminal(is_terminal: bool) -> Self {
        Self { colorize: is_terminal }
    }
}

impl ErrorStack {
    /// The full report: message, then the traceback if there is more than
    /// one frame.
    pub fn render(&self, config: &FormatConfig) -> String {
        match self.error_message(config) {
            Some(message) if self.frames.len() > 1 => {
                format!("{message}\n{}", self.stack_trace(config))
            }
            Some(message) => message,
            // column points past the end of the line; the source we have
            // doesn't match what was parsed, so only trust the traceback
            None => format!("{}\n{}", self.cause, self.stack_trace(config)),
        }
    }

    /// Message and source context for the outermost frame, which is usually
    /// the call the user actually wrote. `None` if the frame's column does
    /// not fit its source line.
    fn error_message(&self, config: &FormatConfig) -> Option<String> {
        let n = self.frames.len() - 1;
        let frame = &self.frames[n];
        let ctx = read_context(self.readers[n].as_ref(), frame.line.saturating_sub(1));
        if ctx.is_empty() {
            return Some(self.cause.to_string());
        }
        let mut line = ctx.line;
        let chars_before = frame.column.saturating_sub(1);
        let line_len = line.chars().count();
        if chars_before == line_len {
            line.push_str("  ");
        } else if chars_before > line_len {
            tracing::debug!("column {} is beyond the end of {frame}", frame.column);
            return None;
        }
        let spaces = " ".repeat(chars_before);
        if !config.colorize {
            return Some(format!(
                "{}:{}:{}: error: {}\n{}\n{}\n{}^\n{}\n",
                frame.filename, frame.line, frame.column, self.cause, ctx.before, line, spaces, ctx.after
            ));
        }
        let split = line
            .char_indices()
            .nth(chars_before)
            .map(|(i, _)| i)
            .unwrap_or(line.len());
        let (head, rest) = line.split_at(split);
        let mut rest = rest.chars();
        let marked = rest.next().unwrap_or(' ');
        let tail = rest.as_str();
        Some(format!(
            "{BOLD_WHITE}{}{RESET}:{BOLD_WHITE}{}{RESET}:{BOLD_WHITE}{}{RESET}: {BOLD_RED}error:{RESET} {BOLD_WHITE}{}{RESET}\n\
             {GREY}{}\n\
             {WHITE}{head}{RED}{marked}{WHITE}{tail}\n\
             {spaces}^\n\
             {GREY}{}{RESET}\n",
            frame.filename, frame.line, frame.column, self.cause, ctx.before, ctx.after
        ))
    }

    /// One aligned row per frame, innermost first.
    fn stack_trace(&self, config: &FormatConfig) -> String {
        let filenames = equalise_lengths(self.frames.iter().map(|f| f.filename.clone()).collect());
        let lines = equalise_lengths(self.frames.iter().map(|f| f.line.to_string()).collect());
        let cols = equalise_lengths(self.frames.iter().map(|f| f.column.to_string()).collect());

        let mut rows = Vec::with_capacity(self.frames.len());
        let mut last: Option<&Position> = None;
        for (i, frame) in self.frames.iter().enumerate() {
            if last.is_some_and(|prev| prev.same_line(frame)) {
                continue; // Don't show the same line twice.
            }
            last = Some(frame);
            let mut source = read_context(self.readers[i].as_ref(), frame.line.saturating_sub(1)).line;
            if source.is_empty() {
                source = if config.colorize {
                    format!("{GREY}{SOURCE_UNAVAILABLE}{RESET}")
                } else {
                    SOURCE_UNAVAILABLE.to_string()
                };
            }
            let location = format!("{}:{}:{}:", filenames[i], lines[i], cols[i]);
            rows.push(if config.colorize {
                format!("{YELLOW}{location}{RESET}   {source}")
            } else {
                format!("{location}   {source}")
            });
        }
        let header = if config.colorize {
            format!("{BOLD_WHITE}Traceback:\n{RESET}")
        } else {
            "Traceback:\n".to_string()
        };
        header + &rows.join("\n")
    }
}

/// Left-pads every string to the width of the widest one.
fn equalise_lengths(mut column: Vec<String>) -> Vec<String> {
    let width = column.iter().map(|s| s.chars().count()).max().unwrap_or(0);
    for s in &mut column {
        *s = format!("{s:>width$}");
    }
    column
}
