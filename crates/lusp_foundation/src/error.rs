//! Error types for lusp.
//!
//! Uses `thiserror` for ergonomic error definition. Compile-time and runtime
//! failures share one `Error` type; [`Error::is_fatal`] separates the
//! corrupt-bytecode kind from recoverable ones.

use std::fmt;

use thiserror::Error;

/// Convenience alias used throughout the lusp crates.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for lusp operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a compile error at the given source position.
    #[must_use]
    pub fn compile(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(ErrorKind::Compile {
            message: message.into(),
            line,
            column,
        })
    }

    /// Creates a capacity limit error.
    #[must_use]
    pub fn limit_exceeded(limit: CapacityLimit, line: u32) -> Self {
        Self::new(ErrorKind::LimitExceeded { limit, line })
    }

    /// Creates a fatal corrupt-bytecode error.
    #[must_use]
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CorruptBytecode(message.into()))
    }

    /// Creates an arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(expected: usize, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch { expected, actual })
    }

    /// Creates an error reported by a native procedure.
    #[must_use]
    pub fn native(name: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Native {
            name,
            message: message.into(),
        })
    }

    /// Returns true if this error signals an internal invariant violation
    /// rather than a problem with the program being run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::CorruptBytecode(_))
    }

    /// Returns the source line the error refers to, if any.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        match self.kind {
            ErrorKind::Compile { line, .. } | ErrorKind::LimitExceeded { line, .. } if line > 0 => {
                Some(line)
            }
            _ => None,
        }
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Malformed source text or an invalid binding.
    #[error("compile error at line {line}:{column}: {message}")]
    Compile {
        /// Description of the problem.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
    },

    /// A configured capacity ceiling was reached.
    #[error("limit exceeded at line {line}: {limit}")]
    LimitExceeded {
        /// Which limit was hit.
        limit: CapacityLimit,
        /// Source line being compiled, or 0 at run time.
        line: u32,
    },

    /// Bytecode violated an invariant the compiler guarantees.
    #[error("corrupt bytecode: {0}")]
    CorruptBytecode(String),

    /// Integer division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Wrong number of arguments passed to a closure.
    #[error("arity mismatch: expected {expected}, got {actual}")]
    ArityMismatch {
        /// Number of declared parameters.
        expected: usize,
        /// Number of arguments supplied.
        actual: usize,
    },

    /// A native procedure failed.
    #[error("{name}: {message}")]
    Native {
        /// Name the procedure was registered under.
        name: &'static str,
        /// What went wrong.
        message: String,
    },

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Capacity ceilings enforced while compiling or running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityLimit {
    /// Instructions in one function body.
    Instructions(usize),
    /// Registers in one function's window.
    Registers(usize),
    /// Upvalues captured by one function.
    Upvalues(usize),
    /// Bindings introduced in one scope.
    Bindings(usize),
    /// Nesting depth of scopes and functions.
    Depth(usize),
    /// Nested closure calls at run time.
    CallDepth(usize),
}

impl fmt::Display for CapacityLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instructions(limit) => write!(f, "more than {limit} instructions in one function"),
            Self::Registers(limit) => write!(f, "more than {limit} registers in one function"),
            Self::Upvalues(limit) => write!(f, "more than {limit} upvalues in one function"),
            Self::Bindings(limit) => write!(f, "more than {limit} bindings in one scope"),
            Self::Depth(limit) => write!(f, "nesting deeper than {limit}"),
            Self::CallDepth(limit) => write!(f, "call depth exceeds {limit}"),
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Source file or input name.
    pub source: Option<String>,
    /// The offending source line, when known.
    pub snippet: Option<String>,
    /// Free-form notes, innermost first.
    pub notes: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source name.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the offending source line.
    #[must_use]
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// Adds a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "in {source}")?;
        }
        if let Some(snippet) = &self.snippet {
            if self.source.is_some() {
                writeln!(f)?;
            }
            write!(f, "  | {snippet}")?;
        }
        for note in &self.notes {
            write!(f, "\n  = {note}")?;
        }
        Ok(())
    }
}
