//! Diagnostic types for the lexical, syntactic, and runtime failure modes
//! the interpreter can produce.

use crate::token::{Position, Span};
use std::fmt;

/// One frame of a runtime traceback, captured from the call-context chain
/// active at the point a [`ThistleError`] was raised.
#[derive(Debug, Clone)]
pub struct TraceFrame {
    pub filename: std::rc::Rc<str>,
    pub line: u32,
    pub display_name: String,
}

/// The four diagnostic kinds the pipeline can produce. Every kind carries
/// the source span where the failure was detected.
#[derive(Debug)]
pub enum ThistleErrorKind {
    /// The lexer encountered a character it cannot start any token with.
    IllegalCharacter(char),
    /// A multi-character operator was begun but not completed.
    ExpectedChar { expected: char, context: String },
    /// The parser expected a specific token or production and did not find
    /// it. `detail` names the legal continuations.
    InvalidSyntax(String),
    /// The evaluator hit an illegal operation, a division/modulo by zero,
    /// an out-of-range index, an argument-count mismatch, or an undefined
    /// name.
    RunTime(String),
}

impl ThistleErrorKind {
    fn label(&self) -> &'static str {
        match self {
            Self::IllegalCharacter(_) => "IllegalCharacterError",
            Self::ExpectedChar { .. } => "ExpectedCharError",
            Self::InvalidSyntax(_) => "InvalidSyntaxError",
            Self::RunTime(_) => "RunTimeError",
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::IllegalCharacter(c) => format!("'{}'", c),
            Self::ExpectedChar { expected, context } => format!("'{}' {}", expected, context),
            Self::InvalidSyntax(s) => s.clone(),
            Self::RunTime(s) => s.clone(),
        }
    }
}

/// A structured diagnostic returned across the library boundary. Never an
/// untagged panic or exception - the embedder always receives one of these.
#[derive(Debug)]
pub struct ThistleError {
    pub kind: ThistleErrorKind,
    pub span: Span,
    /// Populated only for [`ThistleErrorKind::RunTime`]; empty otherwise.
    pub traceback: Vec<TraceFrame>,
}

impl ThistleError {
    pub fn illegal_character(ch: char, start: Position, end: Position) -> Self {
        Self {
            kind: ThistleErrorKind::IllegalCharacter(ch),
            span: start.span_to(&end),
            traceback: Vec::new(),
        }
    }

    pub fn expected_char(expected: char, context: &str, start: Position, end: Position) -> Self {
        Self {
            kind: ThistleErrorKind::ExpectedChar {
                expected,
                context: context.to_string(),
            },
            span: start.span_to(&end),
            traceback: Vec::new(),
        }
    }

    pub fn invalid_syntax(detail: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ThistleErrorKind::InvalidSyntax(detail.into()),
            span,
            traceback: Vec::new(),
        }
    }

    /// Build a runtime error from a pre-walked traceback (oldest frame
    /// first), as `Traceback (most recent call last):` expects.
    pub fn runtime(detail: impl Into<String>, span: Span, traceback: Vec<TraceFrame>) -> Self {
        Self {
            kind: ThistleErrorKind::RunTime(detail.into()),
            span,
            traceback,
        }
    }

    /// Build a runtime error with no traceback yet attached. Value-algebra
    /// operators raise these directly, since they have no access to the
    /// call-context arena; the evaluator attaches the traceback with
    /// [`Self::with_traceback`] as the error propagates past the nearest
    /// context boundary.
    pub fn runtime_plain(detail: impl Into<String>, span: Span) -> Self {
        Self::runtime(detail, span, Vec::new())
    }

    /// Attach a traceback if one is not already set. A no-op once a
    /// traceback has been recorded, so the frames captured closest to where
    /// the error originated win.
    pub fn with_traceback(mut self, frames: Vec<TraceFrame>) -> Self {
        if self.traceback.is_empty() {
            self.traceback = frames;
        }
        self
    }

    /// Render the diagnostic the way a host surfaces it to a user:
    /// `"<kind>:<details>\n"` followed by a `File<filename>,line<N>` location
    /// line, with a traceback prepended for runtime errors.
    pub fn show_error(&self) -> String {
        let mut out = String::new();
        if !self.traceback.is_empty() {
            out.push_str("Traceback (most recent call last):\n");
            for frame in &self.traceback {
                out.push_str(&format!(
                    " File<{}>,line<{}>,in<{}>\n",
                    frame.filename, frame.line, frame.display_name
                ));
            }
        }
        out.push_str(&format!("{}:{}\n", self.kind.label(), self.kind.detail()));
        out.push_str(&format!(
            "File<{}>,line<{}>",
            self.span.start.filename,
            self.span.start.line + 1
        ));
        out
    }
}

impl fmt::Display for ThistleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.show_error())
    }
}

impl std::error::Error for ThistleError {}
