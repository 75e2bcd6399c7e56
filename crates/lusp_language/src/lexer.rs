//! Lexer for lusp source text.
//!
//! The lexer converts source text into a stream of tokens. It never fails:
//! malformed input becomes a [`TokenKind::Error`] token and the compiler
//! decides how to report it.

use crate::token::{Span, Token, TokenKind};

/// Lexer for lusp source code.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
    /// Whether the previous token can end an operand, which makes a
    /// following `+` or `-` a binary operator rather than a sign.
    after_operand: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
            after_operand: false,
        }
    }

    /// Returns the source text this lexer reads.
    #[must_use]
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Token::new(
                TokenKind::Eof,
                Span::new(start, start, start_line, start_column),
            );
        };

        let kind = match c {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            ',' => self.single(TokenKind::Comma),
            '|' => self.single(TokenKind::Bar),
            '*' => self.single(TokenKind::Star),
            '/' => self.single(TokenKind::Slash),
            '%' => self.single(TokenKind::Percent),
            '=' => self.single_or_double(TokenKind::Assign, TokenKind::Equal),
            '<' => self.single_or_double(TokenKind::Less, TokenKind::LessEqual),
            '>' => self.single_or_double(TokenKind::Greater, TokenKind::GreaterEqual),
            '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::NotEqual
                } else {
                    TokenKind::Error("unexpected character: !".into())
                }
            }
            '+' | '-' if !self.after_operand && self.number_follows(1) => self.scan_number(),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '.' if self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) => self.scan_number(),
            '.' => self.single(TokenKind::Dot),
            '#' => self.scan_hash(),
            '"' => self.scan_string(),
            c if c.is_ascii_digit() => self.scan_number(),
            c if is_symbol_start(c) => self.scan_symbol(),
            c => {
                self.advance();
                TokenKind::Error(format!("unexpected character: {c}"))
            }
        };

        self.after_operand = matches!(
            kind,
            TokenKind::Boolean(_)
                | TokenKind::Integer(_)
                | TokenKind::Real(_)
                | TokenKind::String(_)
                | TokenKind::Symbol(_)
                | TokenKind::RParen
        );

        Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        )
    }

    /// Tokenizes all source and returns a vector of tokens ending in `Eof`.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Scans `c` or `c=`.
    fn single_or_double(&mut self, single: TokenKind, double: TokenKind) -> TokenKind {
        self.advance();
        if self.peek_char() == Some('=') {
            self.advance();
            double
        } else {
            single
        }
    }

    /// Returns true if a decimal number starts `n` characters ahead.
    fn number_follows(&self, n: usize) -> bool {
        match self.peek_char_n(n) {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => self.peek_char_n(n + 1).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    /// Skips whitespace and `;` comments.
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.advance();
            } else if c == ';' {
                while self.peek_char().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    /// Scans `#t`, `#f` and radix-prefixed integers.
    fn scan_hash(&mut self) -> TokenKind {
        self.advance(); // consume '#'
        let radix = match self.peek_char() {
            Some(c @ ('t' | 'f')) => {
                self.advance();
                if self.peek_char().is_some_and(is_symbol_char) {
                    self.skip_symbol_chars();
                    return TokenKind::Error("malformed boolean literal".into());
                }
                return TokenKind::Boolean(c == 't');
            }
            Some('x') => 16,
            Some('d') => 10,
            Some('o') => 8,
            Some('b') => 2,
            Some(c) => {
                self.advance();
                return TokenKind::Error(format!("unexpected character after #: {c}"));
            }
            None => return TokenKind::Error("unexpected end of input after #".into()),
        };
        self.advance(); // consume radix letter

        let start = self.position;
        self.skip_symbol_chars();
        let digits = &self.source[start..self.position];
        if digits.is_empty() {
            return TokenKind::Error("digit expected".into());
        }
        match i64::from_str_radix(digits, radix) {
            Ok(n) => TokenKind::Integer(n),
            Err(e) => TokenKind::Error(format!("invalid integer: {e}")),
        }
    }

    /// Scans a string literal.
    ///
    /// `\n`, `\r` and `\t` are decoded; any other escaped character is taken
    /// literally.
    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // consume opening '"'
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some(c) => {
                            self.advance();
                            text.push(match c {
                                'n' => '\n',
                                'r' => '\r',
                                't' => '\t',
                                c => c,
                            });
                        }
                        None => {
                            return TokenKind::Error(
                                "unexpected end of input in string escape".into(),
                            );
                        }
                    }
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
                None => {
                    return TokenKind::Error("unterminated string literal".into());
                }
            }
        }
        TokenKind::String(text)
    }

    /// Scans a decimal number (integer or real) with an optional sign.
    fn scan_number(&mut self) -> TokenKind {
        let start = self.position;
        let mut is_real = false;

        if matches!(self.peek_char(), Some('+' | '-')) {
            self.advance();
        }

        self.skip_digits();
        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            is_real = true;
            self.advance();
            self.skip_digits();
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let digit_at = if matches!(self.peek_char_n(1), Some('+' | '-')) { 2 } else { 1 };
            if self.peek_char_n(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_real = true;
                for _ in 0..digit_at {
                    self.advance();
                }
                self.skip_digits();
            }
        }

        if self.peek_char().is_some_and(is_symbol_char) {
            self.skip_symbol_chars();
            return TokenKind::Error(format!(
                "malformed number: {}",
                &self.source[start..self.position]
            ));
        }

        let text = &self.source[start..self.position];
        if is_real {
            match text.parse::<f64>() {
                Ok(n) => TokenKind::Real(n),
                Err(e) => TokenKind::Error(format!("invalid real: {e}")),
            }
        } else {
            match text.parse::<i64>() {
                Ok(n) => TokenKind::Integer(n),
                Err(_) => TokenKind::Error(format!("integer literal out of range: {text}")),
            }
        }
    }

    /// Scans a symbol or keyword.
    fn scan_symbol(&mut self) -> TokenKind {
        let start = self.position;
        self.skip_symbol_chars();
        let name = &self.source[start..self.position];
        TokenKind::keyword(name).unwrap_or_else(|| TokenKind::Symbol(name.to_string()))
    }

    fn skip_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn skip_symbol_chars(&mut self) {
        while self.peek_char().is_some_and(is_symbol_char) {
            self.advance();
        }
    }
}

/// Returns true if `c` can start a symbol.
fn is_symbol_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Returns true if `c` can appear in a symbol after the first character.
fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '?')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize_all(source)
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_empty() {
        assert_eq!(lex(""), vec![TokenKind::Eof]);
        assert_eq!(lex("   \n\t "), vec![TokenKind::Eof]);
    }

    #[test]
    fn lex_comments() {
        assert_eq!(
            lex("1 ; one\n; nothing\n2"),
            vec![TokenKind::Integer(1), TokenKind::Integer(2), TokenKind::Eof]
        );
    }

    #[test]
    fn lex_punctuation() {
        assert_eq!(
            lex("( ) { } , . | ="),
            vec![
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Bar,
                TokenKind::Assign,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_comparisons() {
        assert_eq!(
            lex("== != < <= > >="),
            vec![
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_lone_bang_is_error() {
        assert!(matches!(lex("!")[0], TokenKind::Error(_)));
    }

    #[test]
    fn lex_booleans() {
        assert_eq!(
            lex("#t #f"),
            vec![
                TokenKind::Boolean(true),
                TokenKind::Boolean(false),
                TokenKind::Eof
            ]
        );
        assert!(matches!(lex("#true")[0], TokenKind::Error(_)));
    }

    #[test]
    fn lex_integers() {
        assert_eq!(lex("42")[0], TokenKind::Integer(42));
        assert_eq!(lex("-17")[0], TokenKind::Integer(-17));
        assert_eq!(lex("+5")[0], TokenKind::Integer(5));
        assert_eq!(lex("#xff")[0], TokenKind::Integer(255));
        assert_eq!(lex("#b101")[0], TokenKind::Integer(5));
        assert_eq!(lex("#o17")[0], TokenKind::Integer(15));
        assert_eq!(lex("#d99")[0], TokenKind::Integer(99));
    }

    #[test]
    fn lex_reals() {
        assert_eq!(lex("1.5")[0], TokenKind::Real(1.5));
        assert_eq!(lex(".5")[0], TokenKind::Real(0.5));
        assert_eq!(lex("-2.25")[0], TokenKind::Real(-2.25));
        assert_eq!(lex("1e3")[0], TokenKind::Real(1000.0));
        assert_eq!(lex("2.5e-1")[0], TokenKind::Real(0.25));
    }

    #[test]
    fn lex_malformed_numbers() {
        assert!(matches!(lex("12abc")[0], TokenKind::Error(_)));
        assert!(matches!(lex("#x")[0], TokenKind::Error(_)));
        assert!(matches!(lex("#b102")[0], TokenKind::Error(_)));
        assert!(matches!(lex("99999999999999999999")[0], TokenKind::Error(_)));
    }

    #[test]
    fn lex_minus_after_operand_is_operator() {
        assert_eq!(
            lex("n-1"),
            vec![
                TokenKind::Symbol("n".into()),
                TokenKind::Minus,
                TokenKind::Integer(1),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            lex("f(-1)"),
            vec![
                TokenKind::Symbol("f".into()),
                TokenKind::LParen,
                TokenKind::Integer(-1),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            lex("2 - x"),
            vec![
                TokenKind::Integer(2),
                TokenKind::Minus,
                TokenKind::Symbol("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_strings() {
        assert_eq!(lex(r#""hello""#)[0], TokenKind::String("hello".into()));
        assert_eq!(lex(r#""a\nb""#)[0], TokenKind::String("a\nb".into()));
        assert_eq!(lex(r#""say \"hi\"""#)[0], TokenKind::String("say \"hi\"".into()));
        assert_eq!(lex(r#""\q""#)[0], TokenKind::String("q".into()));
    }

    #[test]
    fn lex_unterminated_string() {
        assert!(matches!(lex(r#""oops"#)[0], TokenKind::Error(_)));
    }

    #[test]
    fn lex_symbols_and_keywords() {
        assert_eq!(
            lex("let if else while lettuce null? _tmp x1"),
            vec![
                TokenKind::Let,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::Symbol("lettuce".into()),
                TokenKind::Symbol("null?".into()),
                TokenKind::Symbol("_tmp".into()),
                TokenKind::Symbol("x1".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_closure_literal() {
        assert_eq!(
            lex("|(a, b) a|"),
            vec![
                TokenKind::Bar,
                TokenKind::LParen,
                TokenKind::Symbol("a".into()),
                TokenKind::Comma,
                TokenKind::Symbol("b".into()),
                TokenKind::RParen,
                TokenKind::Symbol("a".into()),
                TokenKind::Bar,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_span_tracking() {
        let tokens = Lexer::tokenize_all("let x\n  = 10");
        assert_eq!(tokens[0].span, Span::new(0, 3, 1, 1));
        assert_eq!(tokens[1].span, Span::new(4, 5, 1, 5));
        assert_eq!(tokens[2].span.line, 2);
        assert_eq!(tokens[2].span.column, 3);
        assert_eq!(tokens[3].span.text("let x\n  = 10"), "10");
    }
}
