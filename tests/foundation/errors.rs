//! Integration tests for Error types
//!
//! Tests error construction, display, context, and fatality.

use lusp_foundation::{CapacityLimit, Error, ErrorContext, ErrorKind};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_compile() {
    let err = Error::compile("expected '}'", 4, 12);
    assert!(matches!(
        err.kind,
        ErrorKind::Compile {
            line: 4,
            column: 12,
            ..
        }
    ));
    assert_eq!(format!("{err}"), "compile error at line 4:12: expected '}'");
    assert_eq!(err.line(), Some(4));
}

#[test]
fn error_limit_exceeded() {
    let err = Error::limit_exceeded(CapacityLimit::Upvalues(8), 2);
    let msg = format!("{err}");
    assert!(msg.contains("line 2"));
    assert!(msg.contains("more than 8 upvalues"));
    assert_eq!(err.line(), Some(2));
}

#[test]
fn runtime_limit_has_no_line() {
    let err = Error::limit_exceeded(CapacityLimit::CallDepth(200), 0);
    assert_eq!(err.line(), None);
    assert!(format!("{err}").contains("call depth exceeds 200"));
}

#[test]
fn error_corrupt_bytecode() {
    let err = Error::corrupt("register r9 outside a window of 2");
    assert!(err.is_fatal());
    assert!(format!("{err}").starts_with("corrupt bytecode: "));
}

#[test]
fn error_division_by_zero() {
    let err = Error::new(ErrorKind::DivisionByZero);
    assert!(!err.is_fatal());
    assert_eq!(format!("{err}"), "division by zero");
}

#[test]
fn error_arity_mismatch() {
    let err = Error::arity_mismatch(2, 3);
    assert_eq!(format!("{err}"), "arity mismatch: expected 2, got 3");
}

#[test]
fn error_native() {
    let err = Error::native("car", "expected a pair, got integer");
    assert!(matches!(err.kind, ErrorKind::Native { name: "car", .. }));
    assert_eq!(format!("{err}"), "car: expected a pair, got integer");
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn error_with_context() {
    let ctx = ErrorContext::new()
        .with_source("counter.lsp")
        .with_snippet("let = 1")
        .with_note("a name must follow 'let'");
    let err = Error::compile("expected symbol", 3, 5).with_context(ctx);

    let ctx = err.context.as_ref().expect("context");
    assert_eq!(ctx.source.as_deref(), Some("counter.lsp"));
    assert_eq!(
        ctx.to_string(),
        "in counter.lsp\n  | let = 1\n  = a name must follow 'let'"
    );
}

#[test]
fn context_does_not_change_display() {
    let plain = Error::arity_mismatch(0, 1);
    let with_ctx = Error::arity_mismatch(0, 1).with_context(ErrorContext::new().with_note("x"));
    assert_eq!(plain.to_string(), with_ctx.to_string());
}

#[test]
fn error_is_std_error() {
    fn takes_error(_: &dyn std::error::Error) {}
    takes_error(&Error::corrupt("x"));
}
