//! The main REPL implementation.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use lusp_foundation::{Error, ErrorContext, ErrorKind, Result};
use lusp_language::{Compiler, CompilerLimits, Environment, Value, Vm};
use tracing::debug;

use crate::editor::{LineEditor, ReadResult, RustylineEditor};
use crate::prelude;

/// Returns true once every `(`, `{` and closure bar in `input` is closed.
///
/// Brackets inside strings and comments are ignored. An unterminated string
/// also counts as incomplete.
#[must_use]
pub fn is_complete(input: &str) -> bool {
    let mut depth = 0i32;
    let mut bars = 0usize;
    let mut in_string = false;
    let mut in_comment = false;
    let mut escape_next = false;

    for c in input.chars() {
        if in_comment {
            in_comment = c != '\n';
            continue;
        }
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            ';' if !in_string => in_comment = true,
            '(' | '{' if !in_string => depth += 1,
            ')' | '}' if !in_string => depth -= 1,
            '|' if !in_string => bars += 1,
            _ => {}
        }
    }

    depth <= 0 && bars % 2 == 0 && !in_string
}

/// The interactive REPL.
pub struct Repl<E: LineEditor = RustylineEditor> {
    /// The line editor for input.
    editor: E,

    /// Globals shared by everything evaluated in this session.
    env: Environment,

    /// The VM; it keeps no state between evaluations.
    vm: Vm,

    limits: CompilerLimits,

    /// Whether to show the welcome banner.
    show_banner: bool,

    /// Primary prompt.
    prompt: String,

    /// Continuation prompt (for multi-line input).
    continuation_prompt: String,
}

impl Repl<RustylineEditor> {
    /// Creates a new REPL with the default rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new() -> Result<Self> {
        let editor = RustylineEditor::new()?;
        Ok(Self::with_editor(editor))
    }
}

impl<E: LineEditor> Repl<E> {
    /// Creates a new REPL with the given editor and the prelude installed.
    pub fn with_editor(editor: E) -> Self {
        let mut env = Environment::new();
        prelude::install(&mut env);
        Self {
            editor,
            env,
            vm: Vm::new(),
            limits: CompilerLimits::default(),
            show_banner: true,
            prompt: "lusp> ".to_string(),
            continuation_prompt: "...   ".to_string(),
        }
    }

    /// Replaces the VM, e.g. with one using a tracing backend.
    #[must_use]
    pub fn with_vm(mut self, vm: Vm) -> Self {
        self.vm = vm;
        self
    }

    /// Replaces the compiler limits.
    #[must_use]
    pub fn with_limits(mut self, limits: CompilerLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Disables the welcome banner.
    #[must_use]
    pub fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Sets the primary prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Returns the session environment.
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Returns the session environment mutably.
    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Runs the REPL loop until end of input or `:quit`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            self.print_banner();
        }
        self.refresh_completions();

        let result = loop {
            match self.read_eval_print() {
                Ok(true) => {}
                Ok(false) => break Ok(()),
                Err(e) if matches!(e.kind, ErrorKind::Internal(_)) => break Err(e),
                Err(e) => self.print_error(&e),
            }
        };

        self.editor.save_history();
        println!();
        result
    }

    /// Executes one read-eval-print iteration.
    ///
    /// Returns `Ok(true)` to continue, `Ok(false)` to exit.
    fn read_eval_print(&mut self) -> Result<bool> {
        let Some(input) = self.read_input()? else {
            return Ok(false);
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(true);
        }
        self.editor.add_history(&input);

        if trimmed == ":quit" {
            return Ok(false);
        }
        if let Some(source) = trimmed.strip_prefix(":dump") {
            match self.dump(source) {
                Ok(listing) => print!("{listing}"),
                Err(e) => self.print_error(&with_snippet(e, source)),
            }
            return Ok(true);
        }

        match self.eval(&input) {
            Ok(value) => {
                if !value.is_null() {
                    println!("{}", format_value(&value));
                }
            }
            Err(e) => self.print_error(&with_snippet(e, &input)),
        }
        self.refresh_completions();

        Ok(true)
    }

    /// Reads a potentially multi-line input.
    fn read_input(&mut self) -> Result<Option<String>> {
        let mut input = String::new();
        let mut first_line = true;

        loop {
            let prompt = if first_line {
                &self.prompt
            } else {
                &self.continuation_prompt
            };

            match self.editor.read_line(prompt)? {
                ReadResult::Line(line) => {
                    if first_line {
                        input = line;
                    } else {
                        input.push('\n');
                        input.push_str(&line);
                    }

                    if is_complete(&input) {
                        return Ok(Some(input));
                    }

                    first_line = false;
                }
                ReadResult::Interrupted => {
                    if !first_line {
                        println!("\nInput cancelled.");
                    }
                    return Ok(Some(String::new()));
                }
                ReadResult::Eof => {
                    if first_line {
                        return Ok(None);
                    }
                    return Err(Error::compile(
                        "unexpected end of input in multi-line entry",
                        1,
                        1,
                    ));
                }
            }
        }
    }

    /// Compiles and runs `input` against the session environment.
    ///
    /// # Errors
    ///
    /// Returns an error if compilation or execution fails.
    pub fn eval(&mut self, input: &str) -> Result<Value> {
        let program = Compiler::new()
            .with_limits(self.limits)
            .compile(&mut self.env, input)?;
        self.vm.execute(&self.env, &program)
    }

    /// Compiles `source` and returns its disassembly, nested closures included.
    ///
    /// # Errors
    ///
    /// Returns an error if compilation fails.
    pub fn dump(&mut self, source: &str) -> Result<String> {
        let program = Compiler::new()
            .with_limits(self.limits)
            .compile(&mut self.env, source)?;
        Ok(program.code().disassemble(true))
    }

    /// Reads and evaluates a source file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or evaluated; it carries
    /// the file name and offending line as context.
    pub fn eval_file(&mut self, path: &Path) -> Result<Value> {
        let source = read_source(path)?;
        debug!(path = %path.display(), bytes = source.len(), "evaluating file");
        self.eval(&source)
            .map_err(|e| attach_source(with_snippet(e, &source), path))
    }

    /// Reads a source file and returns its disassembly.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or compiled.
    pub fn dump_file(&mut self, path: &Path) -> Result<String> {
        let source = read_source(path)?;
        self.dump(&source)
            .map_err(|e| attach_source(with_snippet(e, &source), path))
    }

    fn refresh_completions(&mut self) {
        let names = self.env.names().map(String::from).collect();
        self.editor.set_completions(names);
    }

    /// Prints an error to stderr.
    #[allow(clippy::unused_self)]
    fn print_error(&self, error: &Error) {
        eprintln!("\x1b[31mError: {error}\x1b[0m");
        if let Some(context) = &error.context {
            eprintln!("{context}");
        }
    }

    /// Prints the welcome banner.
    #[allow(clippy::unused_self)]
    fn print_banner(&self) {
        println!("lusp v{}", env!("CARGO_PKG_VERSION"));
        println!("Type statements to evaluate. :dump <src> disassembles, :quit or Ctrl+D exits.\n");
        let _ = io::stdout().flush();
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        Error::new(ErrorKind::Internal(format!(
            "failed to read {}: {e}",
            path.display()
        )))
    })
}

/// Formats a value for display.
fn format_value(value: &Value) -> String {
    format!("\x1b[1m{value}\x1b[0m")
}

/// Attaches the source line an error points at, if it names one.
fn with_snippet(error: Error, source: &str) -> Error {
    let mut context = error.context.clone().unwrap_or_default();
    if let Some(line) = error.line() {
        let index = usize::try_from(line).map_or(usize::MAX, |line| line.saturating_sub(1));
        if let Some(text) = source.lines().nth(index) {
            context = context.with_snippet(text.trim_end());
        }
    }
    if error.is_fatal() {
        context = context.with_note("evaluation aborted on corrupt bytecode");
    }
    if context.snippet.is_none() && context.notes.is_empty() && context.source.is_none() {
        return error;
    }
    error.with_context(context)
}

fn attach_source(error: Error, path: &Path) -> Error {
    let context = error
        .context
        .clone()
        .unwrap_or_default()
        .with_source(path.display().to_string());
    error.with_context(context)
}
