//! Integration tests for the lexer

use lusp_language::{Lexer, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::tokenize_all(source)
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

// =============================================================================
// Literals
// =============================================================================

#[test]
fn literal_tokens() {
    assert_eq!(
        kinds(r#"#t 12 -3.5 "hi" name"#),
        vec![
            TokenKind::Boolean(true),
            TokenKind::Integer(12),
            TokenKind::Real(-3.5),
            TokenKind::String("hi".into()),
            TokenKind::Symbol("name".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn radix_integers() {
    assert_eq!(kinds("#x1F")[0], TokenKind::Integer(31));
    assert_eq!(kinds("#b1111")[0], TokenKind::Integer(15));
}

#[test]
fn sign_binds_to_number_only_in_operand_position() {
    assert_eq!(
        kinds("x -1"),
        vec![
            TokenKind::Symbol("x".into()),
            TokenKind::Minus,
            TokenKind::Integer(1),
            TokenKind::Eof,
        ]
    );
    assert_eq!(
        kinds("(-1)"),
        vec![
            TokenKind::LParen,
            TokenKind::Integer(-1),
            TokenKind::RParen,
            TokenKind::Eof,
        ]
    );
}

// =============================================================================
// Keywords and punctuation
// =============================================================================

#[test]
fn keywords_are_whole_words() {
    assert_eq!(
        kinds("let letter if iffy else while"),
        vec![
            TokenKind::Let,
            TokenKind::Symbol("letter".into()),
            TokenKind::If,
            TokenKind::Symbol("iffy".into()),
            TokenKind::Else,
            TokenKind::While,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn counter_program_tokens() {
    let tokens = kinds("|() x = x + 1 x|");
    assert_eq!(
        tokens,
        vec![
            TokenKind::Bar,
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::Symbol("x".into()),
            TokenKind::Assign,
            TokenKind::Symbol("x".into()),
            TokenKind::Plus,
            TokenKind::Integer(1),
            TokenKind::Symbol("x".into()),
            TokenKind::Bar,
            TokenKind::Eof,
        ]
    );
}

// =============================================================================
// Errors and positions
// =============================================================================

#[test]
fn bad_input_becomes_error_tokens() {
    assert!(matches!(kinds("@")[0], TokenKind::Error(_)));
    assert!(matches!(kinds("\"open")[0], TokenKind::Error(_)));
    assert!(matches!(kinds("3x")[0], TokenKind::Error(_)));
    assert!(matches!(kinds("#q")[0], TokenKind::Error(_)));
}

#[test]
fn lexing_continues_after_an_error() {
    let tokens = kinds("@ 1");
    assert!(matches!(tokens[0], TokenKind::Error(_)));
    assert_eq!(tokens[1], TokenKind::Integer(1));
}

#[test]
fn positions_skip_comments() {
    let source = "; header\n  let x";
    let tokens = Lexer::tokenize_all(source);
    assert_eq!(tokens[0].kind, TokenKind::Let);
    assert_eq!((tokens[0].span.line, tokens[0].span.column), (2, 3));
    assert_eq!(tokens[1].span.text(source), "x");
}

#[test]
fn eof_repeats() {
    let mut lexer = Lexer::new("1");
    assert_eq!(lexer.next_token().kind, TokenKind::Integer(1));
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
}
