//! Lexer, single-pass compiler and register VM for the lusp language.
//!
//! This crate provides:
//! - [`Lexer`] - tokenization of lusp source
//! - [`Compiler`] - single-pass compilation straight to register bytecode
//! - [`Vm`] - register-window interpreter with open/closed upvalues
//! - [`Environment`] - interned symbols and global slots shared by both

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod closure;
pub mod compiler;
pub mod environment;
pub mod lexer;
pub mod opcode;
pub mod token;
pub mod value;
pub mod vm;

pub use closure::{Closure, Upvalue, UpvalueRef, UpvalueState};
pub use compiler::{Compiler, CompilerLimits, compile};
pub use environment::{Environment, GlobalSlot};
pub use lexer::Lexer;
pub use opcode::{BinaryOp, Bytecode, Capture, CodeBuffer, Op, Reg};
pub use token::{Span, Token, TokenKind};
pub use value::{NativeFn, NativeProcedure, Pair, Value};
pub use vm::{
    Backend, Evaluator, Frame, Interpreter, InterpreterBackend, TracingInterpreter, Vm, VmConfig,
    Window, eval, eval_in,
};
