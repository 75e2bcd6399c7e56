//! Integration tests for the compiler
//!
//! Checks emitted code through the public disassembly and error kinds.

use lusp_foundation::{CapacityLimit, ErrorKind};
use lusp_language::{Capture, Compiler, CompilerLimits, Environment, Op, compile};

// =============================================================================
// Disassembly
// =============================================================================

#[test]
fn listing_names_every_instruction() {
    let mut env = Environment::new();
    let program = compile(&mut env, "let x = 1 x + 2").unwrap();
    let listing = program.code().disassemble(false);
    assert!(listing.starts_with("0 params"));
    assert!(listing.contains("load_const"));
    assert!(listing.contains("add"));
    assert!(listing.contains("return"));
}

#[test]
fn deep_listing_includes_closure_bodies() {
    let mut env = Environment::new();
    let program = compile(&mut env, "let x = 1 || x").unwrap();
    let shallow = program.code().disassemble(false);
    let deep = program.code().disassemble(true);
    assert!(!shallow.contains("load_upval"));
    assert!(deep.contains("load_upval"));
    assert!(deep.contains("\n    0 params"));
}

#[test]
fn program_is_a_closure_without_upvalues() {
    let mut env = Environment::new();
    let program = compile(&mut env, "1").unwrap();
    assert_eq!(program.code().param_count(), 0);
    assert_eq!(program.code().upval_count(), 0);
    assert!(program.upvalues().is_empty());
}

#[test]
fn closure_captures_enclosing_local() {
    let mut env = Environment::new();
    let program = compile(&mut env, "let n = 1 let f = || n").unwrap();
    let capture = program.code().ops().iter().find_map(|op| match op {
        Op::CreateClosure(_, _, captures) => Some(captures.clone()),
        _ => None,
    });
    // r0 holds the unit's result, so the first local lives in r1.
    assert_eq!(capture.as_deref(), Some(&[Capture::Register(1)][..]));
    assert!(matches!(program.code().ops().last(), Some(Op::Return(_))));
}

#[test]
fn global_assignment_creates_one_slot() {
    let mut env = Environment::new();
    compile(&mut env, "total = 1 total = total + 1").unwrap();
    assert_eq!(env.len(), 1);
    assert!(env.slot("total").is_some());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn syntax_errors_report_position() {
    let mut env = Environment::new();
    let err = compile(&mut env, "let x = 1\nlet = 2").unwrap_err();
    match err.kind {
        ErrorKind::Compile { line, column, .. } => assert_eq!((line, column), (2, 5)),
        other => panic!("expected compile error, got {other:?}"),
    }
}

#[test]
fn unbalanced_input_is_rejected() {
    let mut env = Environment::new();
    for source in ["(1 + 2", "{ 1", "|a a", "if { 1 }", "1 +"] {
        let err = compile(&mut env, source).unwrap_err();
        assert!(
            matches!(err.kind, ErrorKind::Compile { .. }),
            "{source}: {err}"
        );
    }
}

#[test]
fn duplicate_binding_in_one_scope() {
    let mut env = Environment::new();
    let err = compile(&mut env, "let a let a").unwrap_err();
    assert!(err.to_string().contains("duplicate variable 'a'"));
    assert!(compile(&mut env, "let a { let a }").is_ok());
}

#[test]
fn limits_are_clean_errors() {
    let limits = CompilerLimits {
        max_upvalues: 1,
        ..CompilerLimits::default()
    };
    let mut env = Environment::new();
    let err = Compiler::new()
        .with_limits(limits)
        .compile(&mut env, "let a = 1 let b = 2 || a + b")
        .unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::LimitExceeded {
            limit: CapacityLimit::Upvalues(1),
            line: 1
        }
    ));
}

#[test]
fn error_hook_sees_failures() {
    let mut seen = Vec::new();
    let mut env = Environment::new();
    let result = Compiler::new()
        .on_error(|err| seen.push(err.to_string()))
        .compile(&mut env, "let 5");
    assert!(result.is_err());
    assert_eq!(seen.len(), 1);
}
