//! Diagnostic rendering.
//!
//! The interpreter aborts on the first error, so there is no diagnostic
//! collection machinery here; a [`Diagnostic`] is built from a phase error
//! and rendered once, with the offending source line and a caret.

use std::fmt;

use crate::Span;

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// A fatal error; the run stops.
    Error,
    /// A non-fatal observation.
    Warning,
    /// Extra context attached to another diagnostic.
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// A message tied to a source location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity of the message.
    pub level: Level,
    /// The message body.
    pub message: String,
    /// Where in the source the problem is.
    pub span: Span,
}

impl Diagnostic {
    /// Creates an error-level diagnostic.
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            span,
        }
    }

    /// Creates a warning-level diagnostic.
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
            span,
        }
    }

    /// Renders the diagnostic against the source it refers to.
    ///
    /// `origin` is the name shown in the location line, usually the file
    /// path or `<repl>`. Output looks like:
    ///
    /// ```text
    /// error: unexpected character '@'
    ///  --> prog.sl:2:9
    ///   |
    /// 2 | let x = @
    ///   |         ^
    /// ```
    ///
    /// A diagnostic with a dummy span renders as the bare message.
    pub fn render(&self, source: &str, origin: &str) -> String {
        if self.span == Span::DUMMY {
            return format!("{}: {}", self.level, self.message);
        }

        let mut out = format!(
            "{}: {}\n --> {}:{}:{}\n",
            self.level, self.message, origin, self.span.line, self.span.column
        );

        let Some(line_text) = source.lines().nth(self.span.line.saturating_sub(1) as usize)
        else {
            return out.trim_end().to_string();
        };

        let line_label = self.span.line.to_string();
        let gutter = " ".repeat(line_label.len());
        let caret_pad = " ".repeat(self.span.column.saturating_sub(1) as usize);
        let caret_width = self.span.len().max(1);

        out.push_str(&format!("{} |\n", gutter));
        out.push_str(&format!("{} | {}\n", line_label, line_text));
        out.push_str(&format!(
            "{} | {}{}",
            gutter,
            caret_pad,
            "^".repeat(caret_width)
        ));
        out
    }
}
