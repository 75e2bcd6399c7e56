//! Syntax highlighting for the REPL, driven by the lusp lexer.

use std::borrow::Cow;

use lusp_language::{Lexer, TokenKind};

const RESET: &str = "\x1b[0m";

/// Highlighter for lusp source.
pub struct LuspHighlighter;

impl LuspHighlighter {
    /// Creates a new highlighter.
    pub const fn new() -> Self {
        Self
    }

    /// Highlights a line of input.
    #[allow(clippy::unused_self)]
    pub fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.is_empty() {
            return Cow::Borrowed(line);
        }

        let mut result = String::with_capacity(line.len() * 2);
        let mut lexer = Lexer::new(line);
        let mut cursor = 0;

        loop {
            let token = lexer.next_token();
            let span = token.span;
            if span.start < cursor || span.end > line.len() {
                break;
            }
            push_trivia(&mut result, &line[cursor..span.start]);
            if token.kind == TokenKind::Eof {
                cursor = span.start;
                break;
            }
            let text = span.text(line);
            match color(&token.kind) {
                Some(code) => {
                    result.push_str(code);
                    result.push_str(text);
                    result.push_str(RESET);
                }
                None => result.push_str(text),
            }
            cursor = span.end;
        }
        result.push_str(&line[cursor..]);

        Cow::Owned(result)
    }
}

impl Default for LuspHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

/// Whitespace and comments between tokens; comments are dimmed.
fn push_trivia(out: &mut String, trivia: &str) {
    let mut rest = trivia;
    while let Some(start) = rest.find(';') {
        out.push_str(&rest[..start]);
        let end = rest[start..].find('\n').map_or(rest.len(), |i| start + i);
        out.push_str("\x1b[2;3m");
        out.push_str(&rest[start..end]);
        out.push_str(RESET);
        rest = &rest[end..];
    }
    out.push_str(rest);
}

fn color(kind: &TokenKind) -> Option<&'static str> {
    match kind {
        TokenKind::Let | TokenKind::If | TokenKind::Else | TokenKind::While => Some("\x1b[1;34m"),
        TokenKind::Integer(_) | TokenKind::Real(_) | TokenKind::Boolean(_) => Some("\x1b[35m"),
        TokenKind::String(_) => Some("\x1b[33m"),
        TokenKind::Bar => Some("\x1b[36m"),
        TokenKind::Error(_) => Some("\x1b[31m"),
        _ => None,
    }
}
